use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

///
/// CONSTANTS
///

const CONTAINER_LINK: &str = "/dbs/{{DATABASE}}/colls/{{COLLECTION}}";

/// Characters the document store rejects in resource ids.
const FORBIDDEN_ID_CHARS: [char; 4] = ['/', '\\', '?', '#'];

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to parse store config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("store config field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    #[error("invalid collection name '{name}'")]
    InvalidCollection { name: String },
}

///
/// ConfigFile
///
/// Root of a store config document; only the `[store]` table is read.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    store: StoreConfig,
}

///
/// StoreConfig
///
/// Connection settings for one document database. `uri` and `access_key`
/// are handed to the backend session untouched.
///

#[derive(Clone, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub uri: String,
    pub access_key: String,
    pub database: String,
    #[serde(default)]
    pub collection_name: Option<String>,
}

impl StoreConfig {
    /// Parse and validate a TOML document with a `[store]` table.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(source)?;
        file.store.validate()?;

        Ok(file.store)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("uri", &self.uri),
            ("access_key", &self.access_key),
            ("database", &self.database),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField { field });
            }
        }

        if let Some(name) = &self.collection_name {
            validate_collection(name)?;
        }

        Ok(())
    }

    /// Collection backing a table: the configured name, else the table id.
    pub fn collection_for<'a>(&'a self, table_id: &'a str) -> Result<&'a str, ConfigError> {
        let name = self.collection_name.as_deref().unwrap_or(table_id);
        validate_collection(name)?;

        Ok(name)
    }

    /// Self link of a collection within the configured database.
    #[must_use]
    pub fn container_link(&self, collection: &str) -> String {
        CONTAINER_LINK
            .replace("{{DATABASE}}", &self.database)
            .replace("{{COLLECTION}}", collection)
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("uri", &self.uri)
            .field("access_key", &"<redacted>")
            .field("database", &self.database)
            .field("collection_name", &self.collection_name)
            .finish()
    }
}

fn validate_collection(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() || name.contains(FORBIDDEN_ID_CHARS) {
        return Err(ConfigError::InvalidCollection {
            name: name.to_string(),
        });
    }

    Ok(())
}

///
/// TESTS
///
