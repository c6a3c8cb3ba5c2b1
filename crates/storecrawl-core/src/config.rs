use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed. Every variable has a
/// default, so a bare environment is valid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("must be a non-negative finite number, got {raw}"),
            })
        }
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected true/false, got {other}"),
            }),
        }
    };

    let log_level = or_default("STORECRAWL_LOG_LEVEL", "info");
    let storefronts_path = PathBuf::from(or_default(
        "STORECRAWL_STOREFRONTS_PATH",
        "./config/storefronts.yaml",
    ));
    let seeds_dir = PathBuf::from(or_default("STORECRAWL_SEEDS_DIR", "./config/seeds"));
    let output_dir = PathBuf::from(or_default("STORECRAWL_OUTPUT_DIR", "./data/products"));
    let archive_dir = PathBuf::from(or_default("STORECRAWL_ARCHIVE_DIR", "./data/archive"));

    let request_timeout_secs = parse_u64("STORECRAWL_REQUEST_TIMEOUT_SECS", "40")?;
    let connect_timeout_secs = parse_u64("STORECRAWL_CONNECT_TIMEOUT_SECS", "20")?;
    let transport_retries = parse_u32("STORECRAWL_TRANSPORT_RETRIES", "5")?;
    let backoff_factor = parse_f64("STORECRAWL_BACKOFF_FACTOR", "0.8")?;
    let max_attempts = parse_u32("STORECRAWL_MAX_ATTEMPTS", "5")?;
    let base_delay_ms = parse_u64("STORECRAWL_BASE_DELAY_MS", "1000")?;
    let max_concurrent_stores = parse_usize("STORECRAWL_MAX_CONCURRENT_STORES", "4")?;
    let accept_invalid_certs = parse_bool("STORECRAWL_ACCEPT_INVALID_CERTS", "true")?;
    let status_interval_secs = parse_u64("STORECRAWL_STATUS_INTERVAL_SECS", "30")?;

    if max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "STORECRAWL_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        log_level,
        storefronts_path,
        seeds_dir,
        output_dir,
        archive_dir,
        request_timeout_secs,
        connect_timeout_secs,
        transport_retries,
        backoff_factor,
        max_attempts,
        base_delay_ms,
        max_concurrent_stores,
        accept_invalid_certs,
        status_interval_secs,
    })
}
