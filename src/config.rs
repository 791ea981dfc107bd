//! Interpreter limits.
//!
//! Both limits guard recursion: the reader descends once per open list, the
//! evaluator once per nested expression and closure call. Hitting either yields
//! [`Error::RecursionLimitExceeded`](crate::Error::RecursionLimitExceeded).

use crate::{DEFAULT_MAX_EVAL_DEPTH, DEFAULT_MAX_PARSE_DEPTH};

/// Environment variable overriding [`Config::max_eval_depth`]
pub const ENV_MAX_EVAL_DEPTH: &str = "JIVE_MAX_EVAL_DEPTH";

/// Environment variable overriding [`Config::max_parse_depth`]
pub const ENV_MAX_PARSE_DEPTH: &str = "JIVE_MAX_PARSE_DEPTH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub max_eval_depth: usize,
    pub max_parse_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
            max_parse_depth: DEFAULT_MAX_PARSE_DEPTH,
        }
    }
}

impl Config {
    pub fn with_max_eval_depth(mut self, depth: usize) -> Self {
        self.max_eval_depth = depth;
        self
    }

    pub fn with_max_parse_depth(mut self, depth: usize) -> Self {
        self.max_parse_depth = depth;
        self
    }

    /// Defaults, overridden by `JIVE_MAX_EVAL_DEPTH` / `JIVE_MAX_PARSE_DEPTH`
    /// when they hold a positive integer
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        if let Some(depth) = read_limit(&lookup, ENV_MAX_EVAL_DEPTH) {
            config.max_eval_depth = depth;
        }
        if let Some(depth) = read_limit(&lookup, ENV_MAX_PARSE_DEPTH) {
            config.max_parse_depth = depth;
        }
        config
    }
}

fn read_limit(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.trim().parse::<usize>() {
        Ok(depth) if depth > 0 => Some(depth),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring invalid depth limit");
            None
        }
    }
}
