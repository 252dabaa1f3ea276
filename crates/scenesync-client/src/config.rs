// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use crate::Error;
use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

/// Connection settings for the annotation platform.
///
/// Settings are read from an optional `config.toml` in the user's config
/// directory and overlaid by `SCENESYNC_*` environment variables:
///
/// | Key | Environment | Default |
/// |-----|-------------|---------|
/// | `server` | `SCENESYNC_SERVER` | |
/// | `token` | `SCENESYNC_TOKEN` | |
/// | `workspace_id` | `SCENESYNC_WORKSPACE_ID` | |
/// | `project_id` | `SCENESYNC_PROJECT_ID` | |
/// | `timeout` | `SCENESYNC_TIMEOUT` | 30 |
/// | `max_retries` | `SCENESYNC_MAX_RETRIES` | 3 |
///
/// The config file lives at:
/// - Linux: `~/.config/scenesync/config.toml`
/// - macOS: `~/Library/Application Support/io.SceneSync.SceneSync/config.toml`
/// - Windows: `C:\Users\<User>\AppData\Roaming\SceneSync\SceneSync\config\config.toml`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the platform, e.g. `https://platform.example.com`.
    #[serde(default)]
    pub server: Option<String>,
    /// Personal access token sent as `x-api-key`.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Maximum retries per request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server: None,
            token: None,
            workspace_id: None,
            project_id: None,
            timeout: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl ClientConfig {
    /// Default location of the config file, if the platform has a config
    /// directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "SceneSync", "SceneSync")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads the configuration from the default config file and the
    /// environment.
    pub fn load() -> Result<Self, Error> {
        Self::load_from(Self::default_path().as_deref())
    }

    /// Loads the configuration from `path`, if given and present, overlaid by
    /// the environment.
    pub fn load_from(path: Option<&Path>) -> Result<Self, Error> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!("Loading configuration from {:?}", path);
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let config = builder
            .add_source(config::Environment::with_prefix("SCENESYNC").try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// The REST API root of the configured server, `{server}/api/v1/`.
    pub fn api_base(&self) -> Result<Url, Error> {
        let server = self
            .server
            .as_deref()
            .ok_or_else(|| Error::InvalidParameters("no server configured".to_string()))?;
        let server = if server.ends_with('/') {
            Url::parse(server)?
        } else {
            Url::parse(&format!("{}/", server))?
        };
        Ok(server.join("api/v1/")?)
    }
}
