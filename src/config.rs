use serde::Deserialize;

use crate::error::ExplorerError;

/// Which address families a DB worker should accept objects for. Routes of
/// the excluded family are dropped at ingest just like a source mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyFilter {
    V4,
    V6,
    Both,
}

impl Default for FamilyFilter {
    fn default() -> Self {
        FamilyFilter::Both
    }
}

fn default_family_filter() -> FamilyFilter {
    FamilyFilter::Both
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    #[serde(default)]
    pub serial_file: Option<String>,
    #[serde(default = "default_family_filter")]
    pub family_filter: FamilyFilter,
}

/// One `{name: [...]}` entry of the `databases:` list in the config file
/// (§6). The original format is a single-key mapping per database; we
/// deserialize it the same way rather than flattening it, so a config file
/// written for the original tool still loads unchanged.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct DatabaseEntry(pub std::collections::HashMap<String, DatabaseConfig>);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub databases: Vec<DatabaseEntry>,
}

impl Config {
    /// Parses a config file's contents. Reading the file off disk is the
    /// out-of-scope collaborator (§1); this just owns the shape and the
    /// parsing logic.
    pub fn from_yaml_str(s: &str) -> Result<Self, ExplorerError> {
        serde_yaml::from_str(s)
            .map_err(|e| ExplorerError::Internal(format!("invalid config: {e}")))
    }

    /// Flattens the `databases` list into `(dbname, config)` pairs, in
    /// file order.
    pub fn database_configs(&self) -> Vec<(String, DatabaseConfig)> {
        self.databases
            .iter()
            .flat_map(|entry| entry.0.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_documented_shape() {
        let yaml = r#"
databases:
  - ripe:
      host: whois.ripe.net
      port: 4444
      dbname: ripe
  - arin:
      host: rr.arin.net
      port: 4444
      dbname: arin
      family_filter: v4
"#;
        let cfg = Config::from_yaml_str(yaml).unwrap();
        let dbs = cfg.database_configs();
        assert_eq!(dbs.len(), 2);
        let arin = dbs.iter().find(|(name, _)| name == "arin").unwrap();
        assert_eq!(arin.1.family_filter, FamilyFilter::V4);
        let ripe = dbs.iter().find(|(name, _)| name == "ripe").unwrap();
        assert_eq!(ripe.1.family_filter, FamilyFilter::Both);
    }
}
