use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

use crate::utils::error::{AppError, AppResult};

pub const DEFAULT_ADMIN_PASS: &str = "changeme";

/// Whitelist a brand-new store starts with when `SEED_WHITELIST` is unset.
pub const DEFAULT_SEED_WHITELIST: [&str; 4] = ["_xzl", "EnderPro", "PixelFreak", "UnruheSMP12"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCreation {
    Open,
    Operator,
}

impl FromStr for PollCreation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(PollCreation::Open),
            "operator" | "admin" => Ok(PollCreation::Operator),
            other => Err(format!("expected 'open' or 'operator', got '{other}'")),
        }
    }
}

/// What `StateStore::mutate` does when the backend rejects a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    /// Keep the in-memory change and report a warning.
    BestEffort,
    /// Roll the in-memory change back and fail the operation.
    Strict,
}

impl FromStr for Durability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "best-effort" | "best_effort" => Ok(Durability::BestEffort),
            "strict" => Ok(Durability::Strict),
            other => Err(format!("expected 'best-effort' or 'strict', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub admin_pass: String,
    pub data_file: Option<PathBuf>,
    pub database_url: Option<String>,
    pub sqlite_path: PathBuf,
    pub legacy_data_file: PathBuf,
    pub poll_creation: PollCreation,
    pub durability: Durability,
    pub seed_whitelist: Vec<String>,
    pub cors_origin: Option<String>,
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:3000".to_string(),
            admin_pass: DEFAULT_ADMIN_PASS.to_string(),
            data_file: None,
            database_url: None,
            sqlite_path: PathBuf::from("data.db"),
            legacy_data_file: PathBuf::from("data.json"),
            poll_creation: PollCreation::Open,
            durability: Durability::BestEffort,
            seed_whitelist: DEFAULT_SEED_WHITELIST.map(String::from).to_vec(),
            cors_origin: None,
            static_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let admin_pass = var("ADMIN_PASS").unwrap_or(defaults.admin_pass);
        if admin_pass == DEFAULT_ADMIN_PASS {
            warn!("ADMIN_PASS is not set, operator routes use the default secret");
        }

        Ok(Self {
            server_addr: var("SERVER_ADDR").unwrap_or(defaults.server_addr),
            admin_pass,
            data_file: var("DATA_FILE").map(PathBuf::from),
            database_url: var("DATABASE_URL"),
            sqlite_path: var("SQLITE_PATH").map_or(defaults.sqlite_path, PathBuf::from),
            legacy_data_file: var("LEGACY_DATA_FILE").map_or(defaults.legacy_data_file, PathBuf::from),
            poll_creation: try_load("POLL_CREATION", defaults.poll_creation)?,
            durability: try_load("PERSISTENCE_MODE", defaults.durability)?,
            // Set but blank means "seed nothing".
            seed_whitelist: env::var("SEED_WHITELIST")
                .map(|raw| parse_list(&raw))
                .unwrap_or(defaults.seed_whitelist),
            cors_origin: var("CORS_ORIGIN"),
            static_dir: var("STATIC_DIR").map(PathBuf::from),
        })
    }
}

/// Unset and blank variables both count as absent.
fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn try_load<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr + std::fmt::Debug,
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::InternalError(format!("Invalid {key} value: {e}"))),
        None => {
            info!("{key} not set, using default: {default:?}");
            Ok(default)
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
