//! Configuration file handling for brgy-reports.
//!
//! The configuration file is stored at `$BRGY_HOME/config.json` and contains the base URL of the
//! barangay backend, the staleness window of the query cache and, optionally, the path to a file
//! holding the API bearer token.

use crate::error::{ErrorType, IntoResult, Res};
use crate::Result;
use crate::utils;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

const APP_NAME: &str = "brgy-reports";
const CONFIG_VERSION: u8 = 1;
const CACHE_TTL_SECS: u64 = 300;
const SECRETS: &str = ".secrets";
const TOKEN: &str = "token";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BRGY_HOME` and from there it loads `$BRGY_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    api_base_url: Url,
}

impl Config {
    /// Creates the home directory, its subdirectories and:
    /// - Creates an initial `config.json` file using `api_url` along with default settings
    /// - Moves `token_file`, if given, into its default location in the home directory.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g.
    ///   `$HOME/brgy-reports`
    /// - `api_url` - The base URL of the barangay backend, e.g. `https://brgy.example.ph/api/`
    /// - `token_file` - A file containing the bearer token for the backend, if it requires one.
    ///
    /// # Errors
    /// - Returns an error if `api_url` is not a valid URL or if any file operation fails.
    pub async fn create(
        dir: impl Into<PathBuf>,
        api_url: &str,
        token_file: Option<&Path>,
    ) -> Res<Self> {
        let api_base_url = parse_base_url(api_url)?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the brgy-reports home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let token_path = match token_file {
            Some(token_file) => {
                utils::rename(token_file, secrets.join(TOKEN)).await?;
                Some(PathBuf::from(SECRETS).join(TOKEN))
            }
            None => None,
        };

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_base_url: api_base_url.to_string(),
            cache_ttl_secs: CACHE_TTL_SECS,
            token_path,
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            api_base_url,
        })
    }

    /// This will
    /// - validate that `brgy_home` exists and that the config file exists
    /// - load the config file
    /// - return the loaded configuration object
    pub async fn load(brgy_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_home(brgy_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_home(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The brgy-reports home directory is missing, run 'brgy-reports init'")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let api_base_url = parse_base_url(&config_file.api_base_url)?;
        debug!("Loaded config from {}", config_path.display());

        Ok(Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
            api_base_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    /// How long a fetched response stays fresh in the query cache.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config_file.cache_ttl_secs)
    }

    /// Returns the token path if one is configured. A relative path is resolved against the home
    /// directory.
    pub fn token_path(&self) -> Option<PathBuf> {
        let p = self.config_file.token_path.clone()?;
        if p.is_absolute() {
            return Some(p);
        }
        Some(self.root.join(p))
    }

    /// Reads the bearer token, if one is configured.
    pub(crate) async fn token(&self) -> Res<Option<String>> {
        match self.token_path() {
            None => Ok(None),
            Some(p) => {
                let token = utils::read(&p).await.context("Unable to read API token")?;
                Ok(Some(token.trim().to_string()))
            }
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "brgy-reports",
///   "config_version": 1,
///   "api_base_url": "https://brgy.example.ph/api/",
///   "cache_ttl_secs": 300,
///   "token_path": ".secrets/token"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "brgy-reports"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the backend. Endpoint paths are joined onto it.
    api_base_url: String,

    /// Staleness window of the query cache, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    cache_ttl_secs: u64,

    /// Path to the bearer token file (optional, relative to the home directory or absolute)
    #[serde(skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

fn default_cache_ttl_secs() -> u64 {
    CACHE_TTL_SECS
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path and validates its `app_name`.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .context("Unable to load config file")?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

/// Parses the backend base URL. A trailing slash is added if missing so that endpoint paths join
/// underneath it rather than replacing its last segment.
fn parse_base_url(s: &str) -> Res<Url> {
    let with_slash = if s.ends_with('/') {
        s.to_string()
    } else {
        format!("{s}/")
    };
    let url = Url::parse(&with_slash).with_context(|| format!("Invalid API URL '{s}'"))?;
    if url.cannot_be_a_base() {
        bail!("The API URL '{s}' cannot be used as a base URL");
    }
    Ok(url)
}
