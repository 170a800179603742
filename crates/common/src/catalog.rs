//! Route catalog
//!
//! Static reference data describing which departure cities the target sells
//! and, for each of them, which destinations can be booked.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::{Error, Result};

/// On-disk representation of a catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Departure cities, in display order
    pub origins: Vec<String>,

    /// Departure city -> bookable destinations
    pub routes: HashMap<String, Vec<String>>,
}

/// Immutable origin/destination reference table
#[derive(Debug, Clone)]
pub struct RouteCatalog {
    origins: Vec<String>,
    routes: HashMap<String, Vec<String>>,
}

impl RouteCatalog {
    /// Build a catalog, checking its invariants
    pub fn new(origins: Vec<String>, routes: HashMap<String, Vec<String>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for origin in &origins {
            if !seen.insert(origin.as_str()) {
                return Err(Error::InvalidCatalog(format!("duplicate origin {}", origin)));
            }
            if !routes.contains_key(origin) {
                return Err(Error::InvalidCatalog(format!("origin {} has no routes", origin)));
            }
        }

        for (origin, destinations) in &routes {
            if !seen.contains(origin.as_str()) {
                return Err(Error::InvalidCatalog(format!(
                    "routes listed for {} which is not an origin",
                    origin
                )));
            }
            if destinations.is_empty() {
                return Err(Error::InvalidCatalog(format!("origin {} has no destinations", origin)));
            }
            if destinations.iter().any(|d| d == origin) {
                return Err(Error::InvalidCatalog(format!("origin {} lists itself as a destination", origin)));
            }
        }

        debug!("Loaded route catalog with {} origins", origins.len());
        Ok(Self { origins, routes })
    }

    /// The reference catalog of the demo booking site, checked like any other
    pub fn builtin() -> Result<Self> {
        const TRANSATLANTIC: &[&str] = &["Buenos Aires", "Rome", "Berlin"];
        const SOUTHERN: &[&str] = &["Buenos Aires", "Rome"];

        let table: [(&str, &[&str]); 7] = [
            ("Paris", TRANSATLANTIC),
            ("Philadelphia", TRANSATLANTIC),
            ("Boston", TRANSATLANTIC),
            ("Portland", TRANSATLANTIC),
            ("San Diego", SOUTHERN),
            ("Mexico City", SOUTHERN),
            ("São Paolo", SOUTHERN),
        ];

        Self::new(
            table.iter().map(|(o, _)| o.to_string()).collect(),
            table
                .iter()
                .map(|(o, ds)| (o.to_string(), ds.iter().map(|d| d.to_string()).collect()))
                .collect(),
        )
    }

    /// Parse a catalog from TOML
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(file.origins, file.routes)
    }

    /// Load a catalog from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Departure cities, in catalog order
    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    pub fn is_valid_origin(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Destinations bookable from `origin`
    pub fn valid_destinations(&self, origin: &str) -> Result<&[String]> {
        self.routes
            .get(origin)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::UnknownOrigin(origin.to_string()))
    }

    pub fn is_valid_pair(&self, origin: &str, destination: &str) -> bool {
        origin != destination
            && self
                .routes
                .get(origin)
                .map(|ds| ds.iter().any(|d| d == destination))
                .unwrap_or(false)
    }

    /// Origins from which `destination` can be booked, in catalog order
    pub fn origins_serving(&self, destination: &str) -> Vec<&String> {
        self.origins
            .iter()
            .filter(|o| self.is_valid_pair(o, destination))
            .collect()
    }

    pub fn to_file(&self) -> CatalogFile {
        CatalogFile {
            origins: self.origins.clone(),
            routes: self.routes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_satisfies_invariants() {
        let builtin = RouteCatalog::builtin().unwrap();
        assert_eq!(builtin.origins().len(), 7);

        for origin in builtin.origins() {
            let destinations = builtin.valid_destinations(origin).unwrap();
            assert!(!destinations.is_empty());
            assert!(!destinations.contains(origin), "{} routes to itself", origin);
        }
    }

    #[test]
    fn test_unknown_origin() {
        let catalog = RouteCatalog::builtin().unwrap();
        let err = catalog.valid_destinations("London").unwrap_err();
        assert!(matches!(err, Error::UnknownOrigin(ref o) if o == "London"));
    }

    #[test]
    fn test_pairs() {
        let catalog = RouteCatalog::builtin().unwrap();
        assert!(catalog.is_valid_pair("Boston", "Berlin"));
        assert!(!catalog.is_valid_pair("San Diego", "Berlin"));
        assert!(!catalog.is_valid_pair("Boston", "Tokyo"));
        assert!(!catalog.is_valid_pair("Paris", "Paris"));
        assert!(catalog.is_valid_origin("São Paolo"));
        assert!(!catalog.is_valid_origin("London"));
    }

    #[test]
    fn test_origins_serving() {
        let catalog = RouteCatalog::builtin().unwrap();
        let berlin: Vec<&str> = catalog.origins_serving("Berlin").iter().map(|s| s.as_str()).collect();
        assert_eq!(berlin, vec!["Paris", "Philadelphia", "Boston", "Portland"]);
        assert!(catalog.origins_serving("Tokyo").is_empty());
    }

    #[test]
    fn test_rejects_self_route() {
        let toml = r#"
origins = ["Paris", "Rome"]

[routes]
Paris = ["Rome", "Paris"]
Rome = ["Paris"]
"#;
        let err = RouteCatalog::from_toml(toml).unwrap_err();
        assert!(matches!(err, Error::InvalidCatalog(_)));
    }

    #[test]
    fn test_rejects_unlisted_origin_and_empty_routes() {
        let unlisted = r#"
origins = ["Paris"]

[routes]
Paris = ["Rome"]
Oslo = ["Rome"]
"#;
        assert!(matches!(RouteCatalog::from_toml(unlisted), Err(Error::InvalidCatalog(_))));

        let empty = r#"
origins = ["Paris"]

[routes]
Paris = []
"#;
        assert!(matches!(RouteCatalog::from_toml(empty), Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            "origins = [\"Oslo\"]\n\n[routes]\nOslo = [\"Rome\", \"Berlin\"]\n",
        )
        .unwrap();

        let catalog = RouteCatalog::load(&path).unwrap();
        assert_eq!(catalog.origins().to_vec(), vec!["Oslo".to_string()]);
        assert!(catalog.is_valid_pair("Oslo", "Berlin"));
    }
}
