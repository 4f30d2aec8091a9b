//! # Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags (`--db`)
//! 2. Environment variables (`PHARMACY_*`)
//! 3. Defaults (this file)

use directories::ProjectDirs;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

use pharmacy_core::Money;

/// Database file name inside the platform data directory.
const DATABASE_FILE: &str = "pharmacy.db";

/// Longest accepted expiry warning window (ten years).
pub const MAX_EXPIRY_WARNING_DAYS: u32 = 3650;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine app data directory")]
    NoDataDir,

    #[error("Could not create data directory {path}: {source}")]
    CreateDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Application configuration.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    /// Explicit database location (`PHARMACY_DB_PATH`). When unset the
    /// platform data directory is used.
    pub database_path: Option<PathBuf>,

    /// Currency symbol (for display). Amounts are always shown in whole
    /// units and two-digit cents.
    pub currency_symbol: String,

    /// Batches expiring within this many days are reported by
    /// `drugs expiring` when no explicit date is given.
    /// Default: 30, at most [`MAX_EXPIRY_WARNING_DAYS`]
    pub expiry_warning_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: None,
            currency_symbol: "€".to_string(),
            expiry_warning_days: 30,
        }
    }
}

impl AppConfig {
    /// Creates a new AppConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `PHARMACY_DB_PATH`: Database file
    /// - `PHARMACY_CURRENCY_SYMBOL`: Currency symbol for display
    /// - `PHARMACY_EXPIRY_WARNING_DAYS`: Default expiry window (e.g. "60")
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = AppConfig::default();

        if let Some(path) = lookup("PHARMACY_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(symbol) = lookup("PHARMACY_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(days) = lookup("PHARMACY_EXPIRY_WARNING_DAYS") {
            match days.trim().parse::<u32>() {
                Ok(days) if days <= MAX_EXPIRY_WARNING_DAYS => config.expiry_warning_days = days,
                _ => warn!(
                    value = %days,
                    max = MAX_EXPIRY_WARNING_DAYS,
                    "Ignoring invalid PHARMACY_EXPIRY_WARNING_DAYS"
                ),
            }
        }

        config
    }

    /// Resolves the database file.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.pharmacy.back-office/pharmacy.db`
    /// - **Windows**: `%APPDATA%\pharmacy\back-office\data\pharmacy.db`
    /// - **Linux**: `~/.local/share/back-office/pharmacy.db`
    pub fn resolve_database_path(&self, flag: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = flag.or_else(|| self.database_path.clone()) {
            return Ok(path);
        }

        let proj_dirs =
            ProjectDirs::from("com", "pharmacy", "back-office").ok_or(ConfigError::NoDataDir)?;
        let data_dir = proj_dirs.data_dir();

        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::CreateDataDir {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(data_dir.join(DATABASE_FILE))
    }

    /// Formats an amount with the configured symbol, e.g. `€12.34`. The sign
    /// goes in front of the symbol: `-€12.34`.
    pub fn format_currency(&self, amount: Money) -> String {
        format!(
            "{}{}{}.{:02}",
            if amount.is_negative() { "-" } else { "" },
            self.currency_symbol,
            amount.units().abs(),
            amount.cents_part()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.database_path, None);
        assert_eq!(config.expiry_warning_days, 30);
        assert_eq!(config.currency_symbol, "€");
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("PHARMACY_DB_PATH", "/srv/pharmacy.db"),
            ("PHARMACY_CURRENCY_SYMBOL", "$"),
            ("PHARMACY_EXPIRY_WARNING_DAYS", "60"),
        ]);
        assert_eq!(config.database_path, Some(PathBuf::from("/srv/pharmacy.db")));
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.expiry_warning_days, 60);
    }

    #[test]
    fn test_invalid_warning_days_keeps_default() {
        let config = config_from(&[("PHARMACY_EXPIRY_WARNING_DAYS", "soon")]);
        assert_eq!(config.expiry_warning_days, 30);
    }

    #[test]
    fn test_flag_beats_env_path() {
        let config = config_from(&[("PHARMACY_DB_PATH", "/srv/pharmacy.db")]);
        let path = config
            .resolve_database_path(Some(PathBuf::from("./local.db")))
            .unwrap();
        assert_eq!(path, PathBuf::from("./local.db"));
        assert_eq!(
            config.resolve_database_path(None).unwrap(),
            PathBuf::from("/srv/pharmacy.db")
        );
    }

    #[test]
    fn test_format_currency() {
        let config = AppConfig {
            currency_symbol: "$".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
        assert_eq!(config.format_currency(Money::from_cents(1)), "$0.01");
        assert_eq!(config.format_currency(Money::from_cents(-1234)), "-$12.34");
    }

    #[test]
    fn test_format_currency_keeps_cents() {
        let config = AppConfig::default();
        assert_eq!(config.format_currency(Money::from_cents(1500)), "€15.00");
        assert_eq!(config.format_currency(Money::from_cents(-5)), "-€0.05");
        assert_eq!(config.format_currency(Money::zero()), "€0.00");
        assert_eq!(
            config.format_currency(Money::from_cents(i64::MIN)),
            "-€92233720368547758.08"
        );
    }

    #[test]
    fn test_warning_days_above_cap_keep_default() {
        let config = config_from(&[("PHARMACY_EXPIRY_WARNING_DAYS", "4294967295")]);
        assert_eq!(config.expiry_warning_days, 30);

        let days = MAX_EXPIRY_WARNING_DAYS.to_string();
        let config = config_from(&[("PHARMACY_EXPIRY_WARNING_DAYS", days.as_str())]);
        assert_eq!(config.expiry_warning_days, MAX_EXPIRY_WARNING_DAYS);
    }
}
