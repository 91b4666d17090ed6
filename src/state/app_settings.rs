use crate::state::pool::check_participant_name;
use bracket_engine::{DEFAULT_MAX_SIMULATIONS, OddsSettings};
use log::LevelFilter;
use std::path::PathBuf;

const DEFAULT_USER: &str = "entrant";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    pub pool_dir: PathBuf,
    pub apply_seed_bonus: bool,
    /// Participant name used for the picks file written by the wizard.
    pub username: String,
    /// Sampled outcomes for win odds once enumeration would take more.
    pub max_simulations: u64,
}

impl AppSettings {
    /// Settings come from the environment:
    ///   BRACKETPOOL_DIR         pool directory (default ".")
    ///   BRACKETPOOL_SEED_BONUS  "0"/"false"/"no"/"off" disables the upset bonus
    ///   BRACKETPOOL_LOG         log level filter
    ///   BRACKETPOOL_USER        picks owner, falling back to USER
    ///   BRACKETPOOL_SIMULATIONS win odds sample budget
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let apply_seed_bonus = non_empty("BRACKETPOOL_SEED_BONUS")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        Self {
            full_screen: false,
            log_level: non_empty("BRACKETPOOL_LOG").and_then(|v| v.parse().ok()),
            pool_dir: non_empty("BRACKETPOOL_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
            apply_seed_bonus,
            // A name that cannot be a picks file name is passed over.
            username: non_empty("BRACKETPOOL_USER")
                .filter(|name| check_participant_name(name).is_ok())
                .or_else(|| non_empty("USER").filter(|name| check_participant_name(name).is_ok()))
                .unwrap_or_else(|| DEFAULT_USER.to_string()),
            max_simulations: non_empty("BRACKETPOOL_SIMULATIONS")
                .and_then(|v| v.parse().ok())
                .filter(|&n: &u64| n > 0)
                .unwrap_or(DEFAULT_MAX_SIMULATIONS),
        }
    }

    pub fn odds_settings(&self) -> OddsSettings {
        OddsSettings {
            apply_seed_bonus: self.apply_seed_bonus,
            max_simulations: self.max_simulations,
            rng_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> AppSettings {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let s = settings(&[]);
        assert_eq!(s.pool_dir, PathBuf::from("."));
        assert!(s.apply_seed_bonus);
        assert_eq!(s.log_level, None);
        assert_eq!(s.username, DEFAULT_USER);
        assert_eq!(s.max_simulations, DEFAULT_MAX_SIMULATIONS);
    }

    #[test]
    fn simulation_budget_is_read() {
        assert_eq!(settings(&[("BRACKETPOOL_SIMULATIONS", "5000")]).max_simulations, 5000);
        assert_eq!(settings(&[("BRACKETPOOL_SIMULATIONS", "0")]).max_simulations, DEFAULT_MAX_SIMULATIONS);
        let s = settings(&[("BRACKETPOOL_SIMULATIONS", "lots"), ("BRACKETPOOL_SEED_BONUS", "off")]);
        assert_eq!(s.max_simulations, DEFAULT_MAX_SIMULATIONS);
        assert!(!s.odds_settings().apply_seed_bonus);
    }

    #[test]
    fn user_names_that_escape_the_picks_dir_are_ignored() {
        let s = settings(&[("BRACKETPOOL_USER", "../../etc/passwd"), ("USER", "sam")]);
        assert_eq!(s.username, "sam");
        let s = settings(&[("BRACKETPOOL_USER", "a/b"), ("USER", "..")]);
        assert_eq!(s.username, DEFAULT_USER);
    }

    #[test]
    fn seed_bonus_can_be_switched_off() {
        assert!(!settings(&[("BRACKETPOOL_SEED_BONUS", "off")]).apply_seed_bonus);
        assert!(!settings(&[("BRACKETPOOL_SEED_BONUS", "0")]).apply_seed_bonus);
        assert!(settings(&[("BRACKETPOOL_SEED_BONUS", "yes")]).apply_seed_bonus);
    }

    #[test]
    fn log_level_and_user_are_read() {
        let s = settings(&[("BRACKETPOOL_LOG", "debug"), ("USER", "sam"), ("BRACKETPOOL_DIR", "/tmp/pool")]);
        assert_eq!(s.log_level, Some(LevelFilter::Debug));
        assert_eq!(s.username, "sam");
        assert_eq!(s.pool_dir, PathBuf::from("/tmp/pool"));

        let s = settings(&[("BRACKETPOOL_USER", "alex"), ("USER", "sam"), ("BRACKETPOOL_LOG", "loud")]);
        assert_eq!(s.username, "alex");
        assert_eq!(s.log_level, None);
    }
}
