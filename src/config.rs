use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::routing::{self, Route, RoutingTable, DEFAULT_AUTHORITY};
use crate::storage::{ConnectionHandle, SeedPolicy};
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Database file; in-memory when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default = "default_authority")]
    pub authority: String,
    #[serde(default)]
    pub seed: SeedPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_timeout_ms: Option<u64>,
    #[serde(default = "default_routes")]
    pub routes: Vec<Route>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            database: None,
            authority: default_authority(),
            seed: SeedPolicy::default(),
            ready_timeout_ms: None,
            routes: default_routes(),
        }
    }
}

fn default_authority() -> String {
    DEFAULT_AUTHORITY.to_string()
}

fn default_routes() -> Vec<Route> {
    routing::demo_routes(DEFAULT_AUTHORITY)
        .into_iter()
        .map(|route| Route { authority: None, ..route })
        .collect()
}

impl RouterConfig {
    pub fn routing_table(&self) -> RoutingTable {
        RoutingTable::from_routes(&self.routes, &self.authority)
    }

    /// Connection handle for the configured database (not yet started)
    pub fn connection_handle(&self) -> ConnectionHandle {
        let handle = match &self.database {
            Some(path) => ConnectionHandle::open(PathBuf::from(path), self.seed),
            None => ConnectionHandle::open_in_memory(self.seed),
        };
        match self.ready_timeout_ms {
            Some(ms) => handle.with_ready_timeout(Duration::from_millis(ms)),
            None => handle,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("content-router.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".content-router").join("store.db")
}

pub fn load_config(path: Option<&Path>) -> Result<Option<RouterConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: RouterConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &RouterConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentUri;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: RouterConfig = toml::from_str("").unwrap();
        assert_eq!(config.authority, DEFAULT_AUTHORITY);
        assert_eq!(config.seed, SeedPolicy::IfEmpty);
        assert!(config.database.is_none());

        let table = config.routing_table();
        assert_eq!(table.table_for(&ContentUri::new(DEFAULT_AUTHORITY, "book")), Some("book"));
        assert_eq!(table.table_for(&ContentUri::new(DEFAULT_AUTHORITY, "user")), Some("user"));
    }

    #[test]
    fn test_custom_routes() {
        let config: RouterConfig = toml::from_str(
            r#"
            authority = "org.example.notes"
            seed = "never"
            ready_timeout_ms = 250

            [[routes]]
            path = "note"
            code = 0
            table = "book"

            [[routes]]
            authority = "org.example.people"
            path = "person"
            code = 1
            table = "user"
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, SeedPolicy::Never);
        assert_eq!(config.ready_timeout_ms, Some(250));
        let table = config.routing_table();
        assert_eq!(table.table_for(&ContentUri::new("org.example.notes", "note")), Some("book"));
        assert_eq!(table.table_for(&ContentUri::new("org.example.people", "person")), Some("user"));
        assert_eq!(table.table_for(&ContentUri::new("org.example.notes", "person")), None);
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content-router.toml");
        let config = RouterConfig {
            database: Some(default_database_path_in(dir.path()).display().to_string()),
            ..RouterConfig::default()
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.database, config.database);
        assert_eq!(loaded.routes, config.routes);
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = default_database_path_in(dir.path());
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
    }
}
