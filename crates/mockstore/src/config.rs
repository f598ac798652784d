//! # Configuration
//!
//! Store configuration is loaded with [`confique`], layering environment variables
//! over an optional TOML file over compiled defaults.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `MOCKSTORE_CASE_SENSITIVE`, `MOCKSTORE_STRICT`, `MOCKSTORE_DATA_DIR`.
//! 2. **Config file**: `mockstore.toml`, usually next to the data directory.
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `case_sensitive` | `false` | Compare resource paths case-sensitively |
//! | `strict` | `false` | Treat `/users/jdoe` and `/users/jdoe/` as different resources |
//! | `data_dir` | current directory | Base directory of the file backend |
//!
//! The first two mirror the host router's "case sensitive routing" and "strict
//! routing" settings and must agree with them.

use crate::error::Result;
use crate::identity::MatchOptions;
use crate::store::fs_backend::FsBackend;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "mockstore.toml";
pub const DATA_DIR_ENV: &str = "MOCKSTORE_DATA_DIR";

/// Configuration for the resource store, stored in `mockstore.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Compare resource paths case-sensitively.
    #[config(env = "MOCKSTORE_CASE_SENSITIVE", default = false)]
    pub case_sensitive: bool,

    /// Require trailing slashes to match exactly.
    #[config(env = "MOCKSTORE_STRICT", default = false)]
    pub strict: bool,

    /// Base directory for the file backend. When absent, the current working
    /// directory is used.
    #[config(env = "MOCKSTORE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            strict: false,
            data_dir: None,
        }
    }
}

impl StoreConfig {
    /// Load from the environment and, if it exists, `file`.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = StoreConfig::builder().env();
        if let Some(file) = file {
            builder = builder.file(file);
        }
        Ok(builder.load()?)
    }

    /// Directory to look for `mockstore.toml` in before any config is loaded:
    /// `explicit`, else `MOCKSTORE_DATA_DIR`, else the current directory.
    pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = explicit {
            return Ok(dir.to_path_buf());
        }
        match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
            _ => Ok(std::env::current_dir()?),
        }
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions::new(self.case_sensitive, self.strict)
    }

    /// File backend rooted at `data_dir`, or the current directory.
    pub fn fs_backend(&self) -> Result<FsBackend> {
        match &self.data_dir {
            Some(dir) => Ok(FsBackend::new(dir.clone())),
            None => FsBackend::in_current_dir(),
        }
    }
}
