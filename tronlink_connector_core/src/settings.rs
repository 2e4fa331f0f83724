use crate::error::ConnectorError;
use crate::models::ChainTarget;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options controlling provider detection
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DetectOptions {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub silent: bool,
    #[serde(default, alias = "mustBeCanonicalWallet")]
    pub must_be_tronlink: bool,
}

fn default_timeout_ms() -> u64 {
    3000
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            silent: false,
            must_be_tronlink: false,
        }
    }
}

impl DetectOptions {
    /// Build options from dynamically typed input (a JS object or JSON).
    ///
    /// A wrongly typed option is a caller bug and fails before any detection runs.
    pub fn from_value(value: &Value) -> Result<Self, ConnectorError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(ConnectorError::Validation(format!(
                    "detect options must be an object, got {}",
                    other
                )))
            }
        };

        let mut options = Self::default();
        for (key, raw) in map {
            match key.as_str() {
                "timeoutMs" | "timeout_ms" | "timeout" => {
                    options.timeout_ms = raw.as_u64().ok_or_else(|| {
                        ConnectorError::Validation(format!(
                            "{} must be a non-negative integer, got {}",
                            key, raw
                        ))
                    })?;
                }
                "silent" => options.silent = expect_bool(key, raw)?,
                "mustBeTronLink" | "mustBeCanonicalWallet" | "must_be_tronlink" => {
                    options.must_be_tronlink = expect_bool(key, raw)?
                }
                _ => {}
            }
        }
        Ok(options)
    }
}

fn expect_bool(key: &str, raw: &Value) -> Result<bool, ConnectorError> {
    raw.as_bool().ok_or_else(|| {
        ConnectorError::Validation(format!("{} must be a boolean, got {}", key, raw))
    })
}

/// Connector configuration as stored in a settings file
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ConnectorSettings {
    #[serde(default)]
    pub detect: DetectOptions,
    #[serde(default)]
    pub default_chain: Option<ChainTarget>,
}

impl ConnectorSettings {
    #[cfg(feature = "native")]
    pub fn from_file(path: &str) -> Result<Self, ConnectorError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path));
        let cfg = builder.build()?;
        let settings: Self = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    #[cfg(feature = "native")]
    pub fn save_to_file(&self, path: &str) -> Result<(), ConnectorError> {
        let toml_string = toml::to_string(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConnectorError> {
        match &self.default_chain {
            Some(ChainTarget::Parameters(params)) => params.validate(),
            Some(ChainTarget::Id(id)) => crate::models::validate_chain_id(*id),
            None => Ok(()),
        }
    }
}
