use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SCHEMA_FILE_NAME: &str = "catchkeeper.schema.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub roster: RosterConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

/// Where and how the JSON log files are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub filter: String,
    pub rotation: LoggingRotation,
    pub retention_days: usize,
    /// Mirrors WARN and above to stderr.
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./logs"),
            filter: "info".to_string(),
            rotation: LoggingRotation::Daily,
            retention_days: 14,
            stderr_warn_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub socket_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("catchkeeper.sock"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Page size used when a listing asks for `limit = 0`.
    pub default_page_limit: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pokeapi.co/api/v2/pokemon/".to_string(),
            timeout_ms: 10_000,
            default_page_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Snapshot rewritten on every committed workflow.
    pub state_path: PathBuf,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("./state/roster.json"),
        }
    }
}

impl Config {
    /// Reads a JSON5 config, checks it against the schema, then anchors relative paths
    /// at the config file's directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let text = fs::read_to_string(config_path)
            .with_context(|| format!("cannot read config {}", config_path.display()))?;
        let document: Value = json5::from_str(&text)
            .with_context(|| format!("config {} is not valid JSON5", config_path.display()))?;

        let base_dir = config_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let schema_path = schema_location(base_dir, &document)?;
        check_schema(&document, &schema_path)?;

        let mut config: Config =
            serde_json::from_value(document).context("config does not match its sections")?;
        config.anchor_paths(base_dir);
        config.check_catalog()?;
        config.check_roster()?;
        Ok(config)
    }

    fn anchor_paths(&mut self, base_dir: &Path) {
        for path in [
            &mut self.server.socket_path,
            &mut self.roster.state_path,
            &mut self.logging.dir,
        ] {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
    }

    fn check_catalog(&self) -> Result<()> {
        let url = Url::parse(self.catalog.base_url.trim())
            .with_context(|| format!("catalog.base_url '{}' is not a url", self.catalog.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("catalog.base_url must use http or https, got '{}'", url.scheme());
        }
        if url.query().is_some() {
            bail!("catalog.base_url must not carry a query string");
        }
        Ok(())
    }

    fn check_roster(&self) -> Result<()> {
        if self.roster.state_path.file_name().is_none() {
            bail!(
                "roster.state_path '{}' must name a file",
                self.roster.state_path.display()
            );
        }
        Ok(())
    }
}

fn schema_location(base_dir: &Path, document: &Value) -> Result<PathBuf> {
    match document.get("$schema").and_then(Value::as_str) {
        Some(declared) => Ok(base_dir.join(declared)),
        None => {
            let beside = base_dir.join(SCHEMA_FILE_NAME);
            if beside.is_file() {
                Ok(beside)
            } else {
                Err(anyhow!(
                    "config has no $schema and {} is missing",
                    beside.display()
                ))
            }
        }
    }
}

fn check_schema(document: &Value, schema_path: &Path) -> Result<()> {
    let schema: Value = fs::read_to_string(schema_path)
        .with_context(|| format!("cannot read schema {}", schema_path.display()))
        .and_then(|text| {
            serde_json::from_str(&text)
                .with_context(|| format!("schema {} is not valid JSON", schema_path.display()))
        })?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| anyhow!("schema does not compile: {err}"))?;

    if let Err(errors) = compiled.validate(document) {
        let details = errors
            .map(|error| format!("{} at '{}'", error, error.instance_path))
            .collect::<Vec<_>>()
            .join("; ");
        bail!("config rejected by schema: {details}");
    }
    Ok(())
}
