//! Interpreter limits and movie-level settings.

/// Default maximum number of simultaneously active handler calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 50;

/// Default per-invocation instruction ceiling.
pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

/// Environment variable overriding [`VmConfig::step_limit`].
pub const STEP_LIMIT_ENV: &str = "LINGO_STEP_LIMIT";

/// How `addAt` on a list treats an existing void at the target position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddAtPolicy {
    /// Overwrite a void placeholder in place; insert otherwise.
    #[default]
    ReplaceVoid,
    /// Always insert, shifting later elements.
    InsertAlways,
}

/// Settings for one [`LingoVM`](crate::LingoVM).
#[derive(Debug, Clone, PartialEq)]
pub struct VmConfig {
    /// Calls beyond this depth raise `CallStackOverflow`.
    pub max_call_depth: usize,
    /// Instructions one handler invocation may execute.
    pub step_limit: u64,
    /// Separator for `item` chunks (`the itemDelimiter`).
    pub item_delimiter: char,
    pub add_at_policy: AddAtPolicy,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            step_limit: DEFAULT_STEP_LIMIT,
            item_delimiter: ',',
            add_at_policy: AddAtPolicy::default(),
        }
    }
}

impl VmConfig {
    /// Defaults, with the step limit taken from `LINGO_STEP_LIMIT` when it
    /// holds a positive integer.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(limit) = std::env::var(STEP_LIMIT_ENV)
            .ok()
            .and_then(|v| parse_step_limit(&v))
        {
            config.step_limit = limit;
        }
        config
    }
}

fn parse_step_limit(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|n| *n > 0)
}
