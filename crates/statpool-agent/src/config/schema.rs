use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use statpool_core::{CounterError, Result, StatusCatalog, StatusEntry};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub counters: CountersSection,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CounterError::Config(format!(
                "unsupported config version {} (expected 1)",
                self.version
            )));
        }
        self.server.validate()?;
        self.counters.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            CounterError::Config(format!(
                "server.listen {:?} is not a valid socket address",
                self.listen
            ))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:9090".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountersSection {
    /// Directory for the region and lock files. System temp dir when unset.
    #[serde(default)]
    pub region_dir: Option<PathBuf>,

    /// Region file name prefix; the coordinator pid is appended.
    #[serde(default = "default_name_hint")]
    pub name_hint: String,

    /// `httpd` for the stock response table, or an inline list of
    /// `{code, label}` entries.
    #[serde(default)]
    pub catalog: CatalogChoice,
}

impl Default for CountersSection {
    fn default() -> Self {
        Self {
            region_dir: None,
            name_hint: default_name_hint(),
            catalog: CatalogChoice::default(),
        }
    }
}

impl CountersSection {
    pub fn validate(&self) -> Result<()> {
        if self.name_hint.is_empty() {
            return Err(CounterError::Config(
                "counters.name_hint must not be empty".into(),
            ));
        }
        if self.name_hint.contains('/') {
            return Err(CounterError::Config(
                "counters.name_hint must not contain path separators".into(),
            ));
        }
        // Inline catalog entries fail the pass here, before any region exists.
        self.build_catalog().map(|_| ())
    }

    pub fn build_catalog(&self) -> Result<StatusCatalog> {
        match &self.catalog {
            CatalogChoice::Named(CatalogName::Httpd) => Ok(StatusCatalog::httpd()),
            CatalogChoice::Inline(entries) => StatusCatalog::new(entries.clone()),
        }
    }
}

fn default_name_hint() -> String {
    "statpool_shm".into()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CatalogChoice {
    Named(CatalogName),
    Inline(Vec<StatusEntry>),
}

impl Default for CatalogChoice {
    fn default() -> Self {
        CatalogChoice::Named(CatalogName::Httpd)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogName {
    Httpd,
}
