use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub(crate) const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every key has a default, so an empty environment yields a usable
/// development config.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
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

    let env = parse_environment(&or_default("CARGOOS_ENV", "development"))?;

    let bind_addr = parse_addr("CARGOOS_BIND_ADDR", "0.0.0.0:8080")?;
    let log_level = or_default("CARGOOS_LOG_LEVEL", "info");
    let user_agent = or_default("CARGOOS_USER_AGENT", DEFAULT_USER_AGENT);

    let search_base_url = or_default(
        "CARGOOS_SEARCH_BASE_URL",
        "https://s.1688.com/selloffer/offer_search.htm",
    );
    let search_deadline_secs = parse_u64("CARGOOS_SEARCH_DEADLINE_SECS", "90")?;
    let offline_dir = PathBuf::from(or_default("CARGOOS_OFFLINE_DIR", "data/offline"));
    let exports_dir = PathBuf::from(or_default("CARGOOS_EXPORTS_DIR", "exports"));
    let scoring_rules_path = PathBuf::from(or_default(
        "CARGOOS_SCORING_RULES_PATH",
        "config/scoring_rules.yaml",
    ));

    let extract_max_candidates = parse_usize("CARGOOS_EXTRACT_MAX_CANDIDATES", "5")?;
    if extract_max_candidates == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CARGOOS_EXTRACT_MAX_CANDIDATES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let extract_detail_marker = or_default("CARGOOS_EXTRACT_DETAIL_MARKER", "detail");
    if extract_detail_marker.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "CARGOOS_EXTRACT_DETAIL_MARKER".to_string(),
            reason: "must be non-empty".to_string(),
        });
    }

    let fx_cbr_url = or_default(
        "CARGOOS_FX_CBR_URL",
        "https://www.cbr.ru/scripts/XML_daily.asp",
    );
    let fx_cache_path = PathBuf::from(or_default(
        "CARGOOS_FX_CACHE_PATH",
        "data/cache/fx_cny_rub.json",
    ));
    let fx_cache_ttl_secs = parse_u64("CARGOOS_FX_CACHE_TTL_SECS", "3600")?;
    let fx_target_currency = or_default("CARGOOS_FX_TARGET_CURRENCY", "RUB");
    let fx_timeout_secs = parse_u64("CARGOOS_FX_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        user_agent,
        search_base_url,
        search_deadline_secs,
        offline_dir,
        exports_dir,
        scoring_rules_path,
        extract_max_candidates,
        extract_detail_marker,
        fx_cbr_url,
        fx_cache_path,
        fx_cache_ttl_secs,
        fx_target_currency,
        fx_timeout_secs,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CARGOOS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
