use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    profiled_env_opt(profile, key)
        .map(|v| parse_bool(&v).unwrap_or(default))
        .unwrap_or(default)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub rules: RulesConfig,
    pub engine: EngineConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `RULECHECK_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("RULECHECK_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            rules: RulesConfig::from_env_profiled(p),
            engine: EngineConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  rules:   dir={}, watch={}", self.rules.dir.display(), self.rules.watch);
        tracing::info!("  engine:  max_depth={}, parallel={}", self.engine.max_depth, self.engine.parallel);
    }

    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "rules": { "dir": self.rules.dir, "watch": self.rules.watch },
            "engine": { "max_depth": self.engine.max_depth, "parallel": self.engine.parallel },
        })
    }
}

// ── Rules ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Root directory that rule references are resolved against.
    pub dir: PathBuf,
    /// Evict cached rule documents when their files change.
    pub watch: bool,
}

impl RulesConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            dir: PathBuf::from(profiled_env_or(p, "RULECHECK_RULES_DIR", DEFAULT_RULES_DIR)),
            watch: profiled_env_bool(p, "RULECHECK_WATCH", false),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_RULES_DIR),
            watch: false,
        }
    }
}

const DEFAULT_RULES_DIR: &str = "data/rules";

// ── Engine ────────────────────────────────────────────────────

/// Default bound on rule-tree recursion (composite nesting plus array descent).
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub max_depth: usize,
    /// Evaluate sibling sub-rules and array elements on the rayon pool.
    pub parallel: bool,
}

impl EngineConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            max_depth: profiled_env_usize(p, "RULECHECK_MAX_DEPTH", DEFAULT_MAX_DEPTH).max(1),
            parallel: profiled_env_bool(p, "RULECHECK_PARALLEL", false),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            parallel: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" on "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn profile_prefixed_keys_win() {
        // Keys are unique to this test so parallel tests don't interfere.
        env::set_var("CFGTEST_RULECHECK_RULES_DIR", "/srv/rules");
        env::set_var("CFGTEST_RULECHECK_MAX_DEPTH", "7");
        env::set_var("CFGTEST_RULECHECK_PARALLEL", "yes");

        let config = Config::for_profile("cfgtest");
        assert_eq!(config.profile, "CFGTEST");
        assert_eq!(config.rules.dir, PathBuf::from("/srv/rules"));
        assert_eq!(config.engine.max_depth, 7);
        assert!(config.engine.parallel);

        env::remove_var("CFGTEST_RULECHECK_RULES_DIR");
        env::remove_var("CFGTEST_RULECHECK_MAX_DEPTH");
        env::remove_var("CFGTEST_RULECHECK_PARALLEL");
    }

    #[test]
    fn zero_max_depth_is_clamped() {
        env::set_var("ZEROTEST_RULECHECK_MAX_DEPTH", "0");
        let config = Config::for_profile("zerotest");
        assert_eq!(config.engine.max_depth, 1);
        env::remove_var("ZEROTEST_RULECHECK_MAX_DEPTH");
    }

    #[test]
    fn default_profile_label() {
        let config = Config::default();
        assert_eq!(config.profile_label(), "default");
        assert_eq!(config.engine.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.summary()["rules"]["dir"], "data/rules");
    }
}
