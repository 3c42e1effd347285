//! Agent config loader (strict parsing).
//!
//! ```yaml
//! version: 1
//! server:
//!   listen: "0.0.0.0:9090"
//! counters:
//!   region_dir: null          # default: system temp dir
//!   name_hint: "statpool_shm"
//!   catalog: httpd            # or [{code: 200, label: "200 OK"}, ...]
//! ```

pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use statpool_core::{CounterError, Result};

pub use schema::{AgentConfig, CatalogChoice, CatalogName, CountersSection, ServerSection};

/// Environment variable naming an alternate config file.
pub const CONFIG_ENV_VAR: &str = "STATPOOL_CONFIG";

/// Config file looked for when `STATPOOL_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "statpool.yaml";

/// Path the agent should load, honoring the override.
pub fn resolve_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load_from_file(path: &Path) -> Result<AgentConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| CounterError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<AgentConfig> {
    let cfg: AgentConfig = serde_yaml::from_str(s)
        .map_err(|e| CounterError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
