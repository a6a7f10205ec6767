// src/utils/state.rs
use anyhow::{Context, Result};
use rules::RuleSetState;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Read the persisted rule-set blob. A missing file yields an empty (pre-migration) state.
pub fn load_state(path: &Path) -> Result<RuleSetState> {
    if !path.exists() {
        tracing::info!("No rule state at {}. Starting fresh.", path.display());
        return Ok(RuleSetState::default());
    }
    let bytes = fs::read(path).with_context(|| format!("reading rule state {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing rule state {}", path.display()))
}

pub fn save_state(path: &Path, state: &RuleSetState) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(state).context("serialize rule state")?;
    write_atomic(path, &bytes).with_context(|| format!("writing rule state {}", path.display()))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
