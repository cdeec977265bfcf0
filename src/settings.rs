use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::naming::{Field, FieldOrder};
use crate::scanner::{DEFAULT_EXTENSIONS, ExtensionFilter};

/// `--config` で渡す JSON 設定。省略した項目は既定値になる
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub extensions: Vec<String>,
    pub field_order: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            field_order: Field::ALL.iter().map(|f| f.key().to_string()).collect(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.field_order()?;
        Ok(settings)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(&self.extensions)
    }

    pub fn field_order(&self) -> Result<FieldOrder, ConfigError> {
        Ok(self.field_order.join(",").parse::<FieldOrder>()?)
    }
}
