use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::table::{DEFAULT_EMPTY_MESSAGE, DEFAULT_NO_SEARCH_RESULTS_MESSAGE, DEFAULT_SEARCH_PLACEHOLDER};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub table: TableConfig,
    pub filter: FilterConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub empty_message: String,
    pub no_search_results_message: String,
    pub search_placeholder: String,
    /// Cap on items accepted in one table request
    pub max_rows: usize,
    /// Route table diagnostics to tracing instead of discarding them
    pub debug_diagnostics: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub max_groups: usize,
    pub max_conditions_per_group: usize,
    pub allow_sql_preview: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Environment defaults first, then per-key overrides
        Self::for_environment(environment).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Table
        if let Ok(v) = env::var("TABLE_EMPTY_MESSAGE") {
            self.table.empty_message = v;
        }
        if let Ok(v) = env::var("TABLE_NO_SEARCH_RESULTS_MESSAGE") {
            self.table.no_search_results_message = v;
        }
        if let Ok(v) = env::var("TABLE_SEARCH_PLACEHOLDER") {
            self.table.search_placeholder = v;
        }
        override_parsed("TABLE_MAX_ROWS", &mut self.table.max_rows);
        override_parsed("TABLE_DEBUG_DIAGNOSTICS", &mut self.table.debug_diagnostics);

        // Filter
        override_parsed("FILTER_MAX_GROUPS", &mut self.filter.max_groups);
        override_parsed("FILTER_MAX_CONDITIONS_PER_GROUP", &mut self.filter.max_conditions_per_group);
        override_parsed("FILTER_ALLOW_SQL_PREVIEW", &mut self.filter.allow_sql_preview);

        // API
        override_parsed("API_PORT", &mut self.api.port);
        override_parsed("API_ENABLE_REQUEST_LOGGING", &mut self.api.enable_request_logging);
        override_parsed("API_MAX_REQUEST_SIZE_BYTES", &mut self.api.max_request_size_bytes);

        // Security
        override_parsed("SECURITY_ENABLE_CORS", &mut self.security.enable_cors);
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            table: TableConfig::defaults(10_000, true),
            filter: FilterConfig {
                max_groups: 20,
                max_conditions_per_group: 50,
                allow_sql_preview: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            table: TableConfig::defaults(5_000, false),
            filter: FilterConfig {
                max_groups: 10,
                max_conditions_per_group: 25,
                allow_sql_preview: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            table: TableConfig::defaults(2_000, false),
            filter: FilterConfig {
                max_groups: 10,
                max_conditions_per_group: 25,
                allow_sql_preview: false,
            },
            api: ApiConfig {
                port: 8080,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

impl TableConfig {
    fn defaults(max_rows: usize, debug_diagnostics: bool) -> Self {
        Self {
            empty_message: DEFAULT_EMPTY_MESSAGE.to_string(),
            no_search_results_message: DEFAULT_NO_SEARCH_RESULTS_MESSAGE.to_string(),
            search_placeholder: DEFAULT_SEARCH_PLACEHOLDER.to_string(),
            max_rows,
            debug_diagnostics,
        }
    }
}

/// Unparseable values keep the current setting
fn override_parsed<T: FromStr>(key: &str, target: &mut T) {
    if let Some(v) = env::var(key).ok().and_then(|v| v.trim().parse().ok()) {
        *target = v;
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
