//! Text normalization helpers used for literal rule matching and duplicate detection.
//!
//! Policy:
//! - Remap the host's private-use icon glyphs (boxed digits, letters, duty icons) to plain text.
//! - Fold the result with Unicode compatibility decomposition (NFKD).
//! - `compact` is a second view that keeps only lower-cased letters and digits.
//!
//! Keep this logic single-sourced to avoid drift between the matcher and the store's dedup keys.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// A contiguous run of icon glyphs that maps onto a contiguous ASCII run.
struct GlyphRange {
    first: u32,
    last: u32,
    offset: u32,
}

impl GlyphRange {
    fn remap(&self, cp: u32) -> Option<char> {
        if cp < self.first || cp > self.last {
            return None;
        }
        char::from_u32(cp - self.offset)
    }
}

/// Nothing below this codepoint is ever remapped.
const GLYPH_FLOOR: char = '\u{E022}';

// Checked in order; first hit wins.
const GLYPH_RANGES: [GlyphRange; 4] = [
    // boxed letters A..Z
    GlyphRange { first: 0xE071, last: 0xE08A, offset: 0xE030 },
    // boxed digits 0..9
    GlyphRange { first: 0xE060, last: 0xE069, offset: 0xE030 },
    // circled digits 1..9
    GlyphRange { first: 0xE0B1, last: 0xE0B9, offset: 0xE080 },
    // level digits 1..9
    GlyphRange { first: 0xE090, last: 0xE098, offset: 0xE05F },
];

static GLYPH_TABLE: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ('\u{E055}', "1"),
        ('\u{E056}', "2"),
        ('\u{E057}', "3"),
        ('\u{E058}', "4"),
        ('\u{E059}', "5"),
        ('\u{E099}', "10"),
        ('\u{E09A}', "11"),
        ('\u{E09B}', "12"),
        ('\u{E09C}', "13"),
        ('\u{E09D}', "14"),
        ('\u{E09E}', "15"),
        ('\u{E09F}', "16"),
        ('\u{E0A0}', "17"),
        ('\u{E0A1}', "18"),
        ('\u{E0A2}', "19"),
        ('\u{E0A3}', "20"),
        ('\u{E0A4}', "21"),
        ('\u{E0A5}', "22"),
        ('\u{E0A6}', "23"),
        ('\u{E0A7}', "24"),
        ('\u{E0A8}', "25"),
        ('\u{E0A9}', "26"),
        ('\u{E0AA}', "27"),
        ('\u{E0AB}', "28"),
        ('\u{E0AC}', "29"),
        ('\u{E0AD}', "30"),
        ('\u{E0AE}', "31"),
        ('\u{E0AF}', "+"),
        ('\u{E070}', "?"),
        ('\u{E022}', "A"),
        ('\u{E024}', "_A"),
        ('\u{E0B0}', "E"),
    ])
});

/// Replace icon glyphs with their plain-text equivalents. Everything else is copied through.
pub fn remap_glyphs(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch < GLYPH_FLOOR {
            out.push(ch);
            continue;
        }
        let cp = ch as u32;
        if let Some(mapped) = GLYPH_RANGES.iter().find_map(|r| r.remap(cp)) {
            out.push(mapped);
            continue;
        }
        match GLYPH_TABLE.get(&ch) {
            Some(rep) => out.push_str(rep),
            None => out.push(ch),
        }
    }
    out
}

/// Normalize text for literal matching: glyph remap, then NFKD.
pub fn normalize(input: &str) -> String {
    remap_glyphs(input).nfkd().collect()
}

/// Keep only letters and digits, lower-cased.
pub fn compact(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars().filter(|c| c.is_alphanumeric()) {
        out.extend(ch.to_lowercase());
    }
    out
}

/// Case-insensitive identity of a literal pattern, or `None` if it normalizes to nothing.
pub fn literal_key(pattern: &str) -> Option<String> {
    let key = normalize(pattern).trim().to_lowercase();
    if key.is_empty() { None } else { Some(key) }
}
