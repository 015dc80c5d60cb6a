use std::{env, path::PathBuf};

pub const DEFAULT_API_BASE: &str = "http://localhost:4000/api";
pub const DEFAULT_RECITE_API_BASE: &str = "https://recite.onrender.com/api/v1";
pub const DEFAULT_LIKES_FILE: &str = ".book_quotes_likes.json";

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub api_base: String,
    pub recite_api_base: String,
    pub likes_file: PathBuf,
}

impl ViewerConfig {
    pub fn from_env() -> Self {
        let var = |key: &str, default: &str| env::var(key).unwrap_or_else(|_| default.to_string());
        Self {
            api_base: var("QUOTES_API_BASE", DEFAULT_API_BASE),
            recite_api_base: var("RECITE_API_BASE", DEFAULT_RECITE_API_BASE),
            likes_file: var("QUOTES_LIKES_FILE", DEFAULT_LIKES_FILE).into(),
        }
    }
}
