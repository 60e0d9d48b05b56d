use std::str::FromStr;

use thiserror::Error;

/// Default browser origins allowed by CORS.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://127.0.0.1:5500", "http://127.0.0.1:1234"];

/// Which storage backend the process runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// JSON file loaded into memory.
    File,
    /// Relational database through sea-orm.
    Sql,
    /// MongoDB collection.
    Mongo,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" | "local" | "json" => Ok(StoreKind::File),
            "sql" | "mysql" | "sqlite" => Ok(StoreKind::Sql),
            "mongodb" | "mongo" => Ok(StoreKind::Mongo),
            other => Err(ConfigError::InvalidStore(other.to_string())),
        }
    }
}

/// Configuration errors raised while reading the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown MOVIE_STORE '{0}' (expected file, sql or mongodb)")]
    InvalidStore(String),

    #[error("{var} must be a number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage backend (default: file)
    pub store: StoreKind,

    /// JSON array used by the file backend (default: ./data/movies.json)
    pub movies_file: String,

    /// Write file-backend mutations back to disk (default: false)
    pub movies_file_persist: bool,

    /// Database URL for the sql backend (e.g. mysql://..., sqlite::memory:)
    pub database_url: String,

    /// MongoDB connection string
    pub mongodb_uri: String,

    /// MongoDB database name (default: moviesdb)
    pub mongodb_database: String,

    /// Server host (default: 127.0.0.1)
    pub server_host: String,

    /// Server port (default: 1234)
    pub server_port: u16,

    /// Environment: development, production, test
    pub environment: String,

    /// Browser origins allowed by CORS
    pub cors_allowed_origins: Vec<String>,

    /// Request body limit in bytes (default: 64 KiB)
    pub max_body_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store: StoreKind::File,
            movies_file: "./data/movies.json".to_string(),
            movies_file_persist: false,
            database_url: "mysql://root@localhost:3306/moviesdb".to_string(),
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_database: "moviesdb".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 1234,
            environment: "development".to_string(),
            cors_allowed_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            max_body_size: 64 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (with .env support).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if missing)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Unset variables take
    /// the [`Default`] value.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let store = match get("MOVIE_STORE") {
            Some(raw) => raw.parse()?,
            None => defaults.store,
        };

        let server_port = match get("SERVER_PORT").or_else(|| get("PORT")) {
            Some(raw) => parse_number("SERVER_PORT", &raw)?,
            None => defaults.server_port,
        };

        let max_body_size = match get("MAX_BODY_SIZE") {
            Some(raw) => parse_number("MAX_BODY_SIZE", &raw)?,
            None => defaults.max_body_size,
        };

        let cors_allowed_origins = match get("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.cors_allowed_origins,
        };

        Ok(Config {
            store,
            movies_file: get("MOVIES_FILE").unwrap_or(defaults.movies_file),
            movies_file_persist: get("MOVIES_FILE_PERSIST")
                .map(|v| is_truthy(&v))
                .unwrap_or(defaults.movies_file_persist),
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            mongodb_uri: get("MONGODB_URI").unwrap_or(defaults.mongodb_uri),
            mongodb_database: get("MONGODB_DATABASE").unwrap_or(defaults.mongodb_database),
            server_host: get("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
            cors_allowed_origins,
            max_body_size,
        })
    }

    /// Check if running in development mode.
    pub fn is_dev(&self) -> bool {
        self.environment == "development"
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_number<T: FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    })
}
