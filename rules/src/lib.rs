// Public modules so pfwatch-core can use them
pub mod matcher;
pub mod normalize;
pub mod store;
pub mod types;

pub use matcher::{find_match, find_match_with, RegexBudget, RegexSkip, REGEX_MAX_INPUT_BYTES, REGEX_TIMEOUT};
pub use normalize::{compact, normalize};
pub use store::{RuleSetState, RuleStore, CURRENT_VERSION, DEFAULT_PATTERNS, DEFAULT_REPORT_TEMPLATE};
pub use types::{MatchResult, Rule, RuleId, RuleMode};
