use std::env;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_LOG_FILTER: &str = "filmorate=debug,actix_web=info";

const BIND_VAR: &str = "FILMORATE_BIND";
const DB_VAR: &str = "FILMORATE_DB";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: String,
    pub db_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Config {
            bind: non_empty(BIND_VAR).unwrap_or_else(|| DEFAULT_BIND.to_owned()),
            db_path: non_empty(DB_VAR).map(PathBuf::from),
        }
    }
}
