use crate::{Error, Result};

const DEFAULT_PLAY_DEDUP_WINDOW_SECS: u64 = 60;
const DEFAULT_COMMENT_MAX_LENGTH: usize = 300;
const DEFAULT_PLAY_GATE_CAPACITY: u64 = 10_000;

/// Process-wide settings of the engagement ledger, injected at startup.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// The only identity the gateway treats as administrator.
    pub admin_user_id: String,
    pub play_dedup_window_secs: u64,
    pub comment_max_length: usize,
    pub play_gate_capacity: u64,
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let admin_user_id = lookup("ADMIN_USER_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::EnvVarError("ADMIN_USER_ID not set".to_string()))?;

        Ok(Self {
            admin_user_id,
            play_dedup_window_secs: parse_or(
                &lookup,
                "PLAY_DEDUP_WINDOW_SECS",
                DEFAULT_PLAY_DEDUP_WINDOW_SECS,
            )?,
            comment_max_length: parse_or(&lookup, "COMMENT_MAX_LENGTH", DEFAULT_COMMENT_MAX_LENGTH)?,
            play_gate_capacity: parse_or(&lookup, "PLAY_GATE_CAPACITY", DEFAULT_PLAY_GATE_CAPACITY)?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| Error::EnvVarError(format!("{key} has an invalid value: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = LedgerConfig::from_lookup(lookup_from(&[("ADMIN_USER_ID", "1")])).unwrap();
        assert_eq!(config.admin_user_id, "1");
        assert_eq!(config.play_dedup_window_secs, 60);
        assert_eq!(config.comment_max_length, 300);
        assert_eq!(config.play_gate_capacity, 10_000);
    }

    #[test]
    fn test_overrides_parsed() {
        let config = LedgerConfig::from_lookup(lookup_from(&[
            ("ADMIN_USER_ID", " root "),
            ("PLAY_DEDUP_WINDOW_SECS", "90"),
            ("COMMENT_MAX_LENGTH", "140"),
        ]))
        .unwrap();
        assert_eq!(config.admin_user_id, "root");
        assert_eq!(config.play_dedup_window_secs, 90);
        assert_eq!(config.comment_max_length, 140);
    }

    #[test]
    fn test_missing_admin_rejected() {
        let result = LedgerConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(Error::EnvVarError(_))));
    }

    #[test]
    fn test_bad_number_rejected() {
        let result = LedgerConfig::from_lookup(lookup_from(&[
            ("ADMIN_USER_ID", "1"),
            ("PLAY_DEDUP_WINDOW_SECS", "soon"),
        ]));
        assert!(matches!(result, Err(Error::EnvVarError(_))));
    }
}
