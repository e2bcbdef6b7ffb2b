use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use mtg_catalog::{
    CatalogClientConfig,
    DEFAULT_CATALOG_URL,
    DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_STANDARD_URL,
    DEFAULT_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use xdg::BaseDirectories;

/// Name of the mtg config directory
const MTG_DIR_NAME: &str = "mtg";
const MTG_CONFIG_FILE: &str = "mtg.toml";
const MTG_ENV_PREFIX: &str = "MTG_";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    /// The URL of the card catalog
    // Kept as a String, the client takes care of the trailing slash.
    pub catalog_url: String,
    /// The URL of the format-window service used for `mtg standard sets`
    pub standard_url: String,
    /// User agent to send with requests
    pub user_agent: Option<String>,
    /// Seconds to wait for a connection
    pub connect_timeout_secs: u64,
    /// Seconds to wait for a whole request, `0` waits forever
    pub timeout_secs: u64,
    /// Additional headers sent with every request
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
}

impl Config {
    /// Creates a [Config] from config files and the environment
    ///
    /// Sources in increasing priority:
    /// - built-in defaults
    /// - `mtg.toml` files in the XDG config directories
    /// - `extra_file`, usually passed with `--config`
    /// - `MTG_*` environment variables, e.g. `MTG_CATALOG_URL`
    pub fn parse(extra_file: Option<&Path>) -> Result<Config> {
        let mtg_dirs = BaseDirectories::with_prefix(MTG_DIR_NAME);

        let mut files = mtg_dirs
            .find_config_files(MTG_CONFIG_FILE)
            .collect::<Vec<_>>();
        // `find_config_files` yields the most important file first
        files.reverse();
        files.extend(extra_file.map(Path::to_path_buf));

        let mtg_envs = env::vars()
            .filter_map(|(k, v)| k.strip_prefix(MTG_ENV_PREFIX).map(|k| (k.to_owned(), v)))
            .collect::<HashMap<_, _>>();

        Self::build(&files, mtg_envs)
    }

    /// Layer `files` and environment variables (without prefix) over the defaults.
    ///
    /// Files listed later take precedence.
    fn build(files: &[PathBuf], envs: HashMap<String, String>) -> Result<Config> {
        let mut builder = HierarchicalConfig::builder()
            .set_default("catalog_url", DEFAULT_CATALOG_URL)?
            .set_default("standard_url", DEFAULT_STANDARD_URL)?
            .set_default("connect_timeout_secs", DEFAULT_CONNECT_TIMEOUT.as_secs())?
            .set_default("timeout_secs", DEFAULT_TIMEOUT.as_secs())?;

        for file in files {
            debug!(?file, "reading config file");
            builder = builder.add_source(
                config::File::from(file.as_path())
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        let builder = builder.add_source(
            Environment::default()
                .source(Some(envs.into_iter().collect()))
                .try_parsing(true),
        );

        builder
            .build()?
            .try_deserialize()
            .context("Could not parse config")
    }

    /// Client configuration for the catalog library.
    pub fn client_config(&self) -> CatalogClientConfig {
        CatalogClientConfig {
            catalog_url: self.catalog_url.clone(),
            standard_url: self.standard_url.clone(),
            extra_headers: self.extra_headers.clone(),
            user_agent: self.user_agent.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
        }
    }
}
