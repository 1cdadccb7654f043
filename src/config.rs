//! Runtime settings.
//!
//! Precedence, lowest first:
//! 1. built-in defaults
//! 2. TOML file (`--config PATH`, else `./doaj.toml` when present)
//! 3. `DOAJ_*` environment variables
//! 4. command-line flags (applied by the binary, then [`Settings::validate`])

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::fetch::{ApiEndpoint, ApiKey, DEFAULT_MAX_RETRIES, DEFAULT_THROTTLE, RetryPolicy, Throttle};
use crate::normalize::{ColumnMap, UnknownField, parse_bool};

/// Bulk export of the catalog.
pub const DEFAULT_CSV_URL: &str = "https://doaj.org/csv";
pub const DEFAULT_API_BASE: &str = "https://doaj.org/api/v4";
pub const DEFAULT_JOURNALS_ENDPOINT: &str = "search/journals";
/// Catalog membership filter; the match-all fallbacks follow it.
pub const DEFAULT_QUERY: &str = "admin.in_doaj:true";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_API_PORT: u16 = 8001;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8000";

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "doaj.toml";

const MAX_PAGE_SIZE: u32 = 1000;
const MAX_THROTTLE_MS: u64 = 60_000;
const MAX_RETRIES_LIMIT: u32 = 10;

/// Errors raised while assembling [`Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for `{key}`: {value}. Expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    #[error(transparent)]
    UnknownColumn(#[from] UnknownField),
}

impl ConfigError {
    fn invalid(key: &str, value: impl fmt::Display, expected: &str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }
}

/// Where an ingest run reads the catalog from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Bulk CSV export, one request.
    #[default]
    Csv,
    /// Paginated search API.
    Api,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "api" => Ok(Self::Api),
            other => Err(ConfigError::invalid("source", other, "'csv' or 'api'")),
        }
    }
}

/// Contents of the TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub source: Option<SourceKind>,
    pub csv_url: Option<String>,
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub api_key_header: Option<String>,
    pub api_key_prefix: Option<String>,
    pub journals_endpoint: Option<String>,
    pub query: Option<String>,
    pub query_param: Option<String>,
    pub page_param: Option<String>,
    pub page_size_param: Option<String>,
    pub page_size: Option<u32>,
    pub query_in_path: Option<bool>,
    pub result_cap: Option<usize>,
    pub throttle_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub output_dir: Option<PathBuf>,
    pub api_port: Option<u16>,
    pub cors_origins: Option<Vec<String>>,
    /// Logical CSV field name → header names to try first.
    pub columns: Option<BTreeMap<String, Vec<String>>>,
}

impl FileConfig {
    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for bad syntax, wrong types or unknown keys.
    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`], [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Effective settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source: SourceKind,
    pub csv_url: String,
    pub api_base: String,
    pub api_key: Option<String>,
    pub api_key_header: String,
    pub api_key_prefix: String,
    pub journals_endpoint: String,
    pub query: String,
    pub query_param: String,
    pub page_param: String,
    pub page_size_param: String,
    pub page_size: u32,
    pub query_in_path: bool,
    /// Opt-in numeric cap on fetched API records.
    pub result_cap: Option<usize>,
    pub throttle_ms: u64,
    pub max_retries: u32,
    /// Snapshot directory written by ingest and read by the API.
    pub output_dir: PathBuf,
    pub api_port: u16,
    pub cors_origins: Vec<String>,
    pub columns: BTreeMap<String, Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: SourceKind::Csv,
            csv_url: DEFAULT_CSV_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            api_key_header: "Authorization".to_string(),
            api_key_prefix: "Bearer".to_string(),
            journals_endpoint: DEFAULT_JOURNALS_ENDPOINT.to_string(),
            query: DEFAULT_QUERY.to_string(),
            query_param: "q".to_string(),
            page_param: "page".to_string(),
            page_size_param: "pageSize".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            query_in_path: false,
            result_cap: None,
            throttle_ms: u64::try_from(DEFAULT_THROTTLE.as_millis()).unwrap_or(600),
            max_retries: DEFAULT_MAX_RETRIES,
            output_dir: PathBuf::from("data"),
            api_port: DEFAULT_API_PORT,
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            columns: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Loads settings from the config file and the process environment.
    ///
    /// An explicit `config_path` must exist; the default `./doaj.toml` is
    /// optional.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from reading, parsing or validating.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => Some(FileConfig::load(path)?),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Some(FileConfig::load(default_path)?)
                } else {
                    None
                }
            }
        };
        Self::from_sources(file, |name| std::env::var(name).ok())
    }

    /// Builds settings from a parsed file and an environment lookup.
    ///
    /// # Errors
    ///
    /// Malformed environment values and failed validation.
    pub fn from_sources<F>(file: Option<FileConfig>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(file) = file {
            settings.apply_file(file);
        }
        settings.apply_env(&env)?;
        settings.validate()?;
        debug!(source = %settings.source, output_dir = %settings.output_dir.display(), "settings loaded");
        Ok(settings)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(source) = file.source {
            self.source = source;
        }
        set_string(&mut self.csv_url, file.csv_url);
        set_string(&mut self.api_base, file.api_base);
        if let Some(key) = file.api_key {
            self.api_key = non_empty(key);
        }
        set_string(&mut self.api_key_header, file.api_key_header);
        if let Some(prefix) = file.api_key_prefix {
            self.api_key_prefix = prefix;
        }
        set_string(&mut self.journals_endpoint, file.journals_endpoint);
        if let Some(query) = file.query {
            self.query = query;
        }
        set_string(&mut self.query_param, file.query_param);
        set_string(&mut self.page_param, file.page_param);
        set_string(&mut self.page_size_param, file.page_size_param);
        if let Some(page_size) = file.page_size {
            self.page_size = page_size;
        }
        if let Some(query_in_path) = file.query_in_path {
            self.query_in_path = query_in_path;
        }
        if let Some(cap) = file.result_cap {
            self.result_cap = (cap > 0).then_some(cap);
        }
        if let Some(throttle_ms) = file.throttle_ms {
            self.throttle_ms = throttle_ms;
        }
        if let Some(max_retries) = file.max_retries {
            self.max_retries = max_retries;
        }
        if let Some(output_dir) = file.output_dir {
            self.output_dir = output_dir;
        }
        if let Some(api_port) = file.api_port {
            self.api_port = api_port;
        }
        if let Some(origins) = file.cors_origins {
            self.cors_origins = origins;
        }
        if let Some(columns) = file.columns {
            self.columns = columns;
        }
    }

    fn apply_env<F>(&mut self, env: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        if let Some(source) = var("DOAJ_SOURCE") {
            self.source = source.parse()?;
        }
        set_string(&mut self.csv_url, var("DOAJ_CSV_URL"));
        set_string(&mut self.api_base, var("DOAJ_API_BASE"));
        if let Some(key) = var("DOAJ_API_KEY") {
            self.api_key = Some(key);
        }
        set_string(&mut self.api_key_header, var("DOAJ_API_KEY_HEADER"));
        // An empty prefix is meaningful (bare key), so read it unfiltered.
        if let Some(prefix) = env("DOAJ_API_KEY_PREFIX") {
            self.api_key_prefix = prefix.trim().to_string();
        }
        set_string(&mut self.journals_endpoint, var("DOAJ_JOURNALS_ENDPOINT"));
        set_string(&mut self.query, var("DOAJ_QUERY"));
        set_string(&mut self.query_param, var("DOAJ_QUERY_PARAM"));
        set_string(&mut self.page_param, var("DOAJ_PAGE_PARAM"));
        set_string(&mut self.page_size_param, var("DOAJ_PAGE_SIZE_PARAM"));
        if let Some(value) = var("DOAJ_PAGE_SIZE") {
            self.page_size = parse_env_number("DOAJ_PAGE_SIZE", &value)?;
        }
        if let Some(value) = var("DOAJ_QUERY_IN_PATH") {
            self.query_in_path = parse_bool(&value)
                .ok_or_else(|| ConfigError::invalid("DOAJ_QUERY_IN_PATH", &value, "a boolean"))?;
        }
        if let Some(value) = var("DOAJ_RESULT_CAP") {
            let cap: usize = parse_env_number("DOAJ_RESULT_CAP", &value)?;
            self.result_cap = (cap > 0).then_some(cap);
        }
        if let Some(value) = var("DOAJ_THROTTLE_MS") {
            self.throttle_ms = parse_env_number("DOAJ_THROTTLE_MS", &value)?;
        }
        if let Some(value) = var("DOAJ_MAX_RETRIES") {
            self.max_retries = parse_env_number("DOAJ_MAX_RETRIES", &value)?;
        }
        if let Some(dir) = var("DOAJ_OUTPUT_DIR").or_else(|| var("DOAJ_DATA_DIR")) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(value) = var("DOAJ_API_PORT") {
            self.api_port = parse_env_number("DOAJ_API_PORT", &value)?;
        }
        if let Some(value) = var("DOAJ_CORS_ORIGINS") {
            self.cors_origins = value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    /// Checks ranges and column names.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] or [`ConfigError::UnknownColumn`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ConfigError::invalid("page_size", self.page_size, "range 1..=1000"));
        }
        if self.throttle_ms > MAX_THROTTLE_MS {
            return Err(ConfigError::invalid("throttle_ms", self.throttle_ms, "range 0..=60000"));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::invalid("max_retries", self.max_retries, "range 0..=10"));
        }
        if self.result_cap == Some(0) {
            return Err(ConfigError::invalid("result_cap", 0, "a positive number"));
        }
        self.column_map()?;
        Ok(())
    }

    /// Search endpoint description for the paginator.
    #[must_use]
    pub fn api_endpoint(&self) -> ApiEndpoint {
        ApiEndpoint {
            base: self.api_base.clone(),
            endpoint: self.journals_endpoint.clone(),
            query_param: self.query_param.clone(),
            page_param: self.page_param.clone(),
            page_size_param: self.page_size_param.clone(),
            page_size: self.page_size,
            query_in_path: self.query_in_path,
        }
    }

    /// The API key header, when a key is configured.
    #[must_use]
    pub fn api_key(&self) -> Option<ApiKey> {
        self.api_key.as_ref().map(|key| ApiKey {
            header: self.api_key_header.clone(),
            prefix: self.api_key_prefix.clone(),
            key: key.clone(),
        })
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_retries(self.max_retries)
    }

    #[must_use]
    pub fn throttle(&self) -> Throttle {
        Throttle::new(Duration::from_millis(self.throttle_ms))
    }

    /// Configured CSV header overrides.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownColumn`] for a key naming no known field.
    pub fn column_map(&self) -> Result<ColumnMap, ConfigError> {
        Ok(ColumnMap::from_config(&self.columns)?)
    }
}

fn set_string(target: &mut String, value: Option<String>) {
    if let Some(value) = value.and_then(non_empty) {
        *target = value;
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_env_number<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(name, value, "a non-negative integer"))
}
