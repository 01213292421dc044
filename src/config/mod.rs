//! Application configuration loaded from CLI, environment, and files.
//!
//! [`RevwatchConfig`] merges command-line arguments, environment variables,
//! and configuration files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.revwatch.toml` in the current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `REVWATCH_*`, plus `GITHUB_TOKEN` as the
//!    last token fallback
//! 4. **Command-line arguments** – `--repositories`/`-r`, `--token`/`-t`, ...
//!
//! # Configuration File
//!
//! ```toml
//! repositories = "octocat/hello-world, octocat/spoon-knife"
//! username = "octocat"
//! check_interval_minutes = 10
//! no_notifications = false
//! client_id = "Iv1.0123456789abcdef"
//! ```

use std::env;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::device_flow::{DEFAULT_LOGIN_BASE, DEFAULT_SCOPE};
use crate::auth::{AuthMethod, DeviceFlowSettings, SecretStore};
use crate::checker::CheckerSettings;
use crate::error::RevwatchError;
use crate::github::locator::parse_base_url;
use crate::github::{BearerToken, DEFAULT_API_BASE, RepositorySlug};
use crate::scheduler::DEFAULT_INTERVAL_MINUTES;

/// Directory name used under the platform data directory.
const APP_DIR_NAME: &str = "revwatch";

/// Operation mode determined by CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Sign in with the OAuth device flow.
    Login,
    /// Remove stored tokens.
    Logout,
    /// Dismiss a pull request in the stored result.
    Dismiss(u64),
    /// Restore a dismissed pull request in the stored result.
    Restore(u64),
    /// Run a single check cycle and print the result.
    CheckOnce,
    /// Check on a schedule until interrupted.
    Watch,
}

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// `--token`, `REVWATCH_TOKEN`, or the configuration file.
    Configuration,
    /// The local secret store.
    Stored(AuthMethod),
    /// The `GITHUB_TOKEN` environment variable.
    Environment,
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `REVWATCH_REPOSITORIES` or `--repositories`: Repositories to watch
/// - `REVWATCH_USERNAME` or `--username`: Reviewer login
/// - `REVWATCH_TOKEN`, `GITHUB_TOKEN`, or `--token`: Authentication token
/// - `REVWATCH_CHECK_INTERVAL_MINUTES` or `--check-interval-minutes`
/// - `REVWATCH_API_BASE`, `REVWATCH_LOGIN_BASE`, `REVWATCH_CLIENT_ID`,
///   `REVWATCH_STATE_DIR`
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use revwatch::RevwatchConfig;
///
/// let config = RevwatchConfig::load().expect("failed to load configuration");
/// let repositories = config.repository_slugs().expect("repositories required");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "REVWATCH",
    discovery(
        dotfile_name = ".revwatch.toml",
        config_file_name = "revwatch.toml",
        app_name = "revwatch"
    )
)]
pub struct RevwatchConfig {
    /// Repositories to watch, as `owner/repo` separated by commas or spaces.
    ///
    /// Can be provided via:
    /// - CLI: `--repositories <LIST>` or `-r <LIST>`
    /// - Environment: `REVWATCH_REPOSITORIES`
    /// - Config file: `repositories = "..."`
    #[ortho_config(cli_short = 'r')]
    pub repositories: Option<String>,

    /// GitHub login of the reviewer.
    ///
    /// When unset, the login of the token owner is looked up once per run.
    #[ortho_config(cli_short = 'u')]
    pub username: Option<String>,

    /// Personal access token for GitHub API authentication.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `REVWATCH_TOKEN` or `GITHUB_TOKEN` (fallback)
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Minutes between scheduled checks. Must be at least 1.
    #[ortho_config(cli_short = 'i')]
    pub check_interval_minutes: u64,

    /// Suppresses review-request notifications.
    ///
    /// Can be provided via:
    /// - CLI: `--no-notifications` / `-q`
    /// - Config file: `no_notifications = true`
    ///
    /// Note: `REVWATCH_NO_NOTIFICATIONS` is not supported because
    /// `ortho_config` does not load boolean values from the environment.
    #[ortho_config(cli_short = 'q')]
    pub no_notifications: bool,

    /// REST API base URL. Defaults to `https://api.github.com`.
    #[ortho_config(cli_short = 'a')]
    pub api_base: Option<String>,

    /// Base URL for device-flow endpoints. Defaults to `https://github.com`.
    #[ortho_config(cli_short = 'b')]
    pub login_base: Option<String>,

    /// OAuth application client id used by `--login`.
    #[ortho_config(cli_short = 'c')]
    pub client_id: Option<String>,

    /// Directory holding persisted state and stored credentials.
    ///
    /// Defaults to `revwatch` under the platform data directory.
    #[ortho_config(cli_short = 's')]
    pub state_dir: Option<String>,

    /// Signs in with the OAuth device flow and exits.
    #[ortho_config(cli_short = 'l')]
    pub login: bool,

    /// Deletes stored tokens and exits.
    #[ortho_config(cli_short = 'L')]
    pub logout: bool,

    /// Runs one check cycle, prints the result, and exits.
    #[ortho_config(cli_short = 'o')]
    pub once: bool,

    /// Dismisses the pull request with this id in the stored result.
    #[ortho_config(cli_short = 'd')]
    pub dismiss: Option<u64>,

    /// Restores the dismissed pull request with this id.
    #[ortho_config(cli_short = 'R')]
    pub restore: Option<u64>,
}

impl Default for RevwatchConfig {
    fn default() -> Self {
        Self {
            repositories: None,
            username: None,
            token: None,
            check_interval_minutes: DEFAULT_INTERVAL_MINUTES,
            no_notifications: false,
            api_base: None,
            login_base: None,
            client_id: None,
            state_dir: None,
            login: false,
            logout: false,
            once: false,
            dismiss: None,
            restore: None,
        }
    }
}

impl RevwatchConfig {
    /// Determines the operation mode based on provided configuration.
    ///
    /// Account commands win over dismissal commands, which win over
    /// `--once`. Without any of them the scheduler runs.
    #[must_use]
    pub const fn operation_mode(&self) -> OperationMode {
        if self.login {
            OperationMode::Login
        } else if self.logout {
            OperationMode::Logout
        } else if let Some(id) = self.dismiss {
            OperationMode::Dismiss(id)
        } else if let Some(id) = self.restore {
            OperationMode::Restore(id)
        } else if self.once {
            OperationMode::CheckOnce
        } else {
            OperationMode::Watch
        }
    }

    /// Checks that the configured values are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RevwatchError::Configuration`] when the interval is zero,
    /// both `dismiss` and `restore` are set, or a base URL does not parse.
    pub fn validate(&self) -> Result<(), RevwatchError> {
        if self.check_interval_minutes == 0 {
            return Err(RevwatchError::configuration(
                "check_interval_minutes must be at least 1",
            ));
        }
        if self.dismiss.is_some() && self.restore.is_some() {
            return Err(RevwatchError::configuration(
                "--dismiss and --restore cannot be used together",
            ));
        }
        self.api_base_url()?;
        self.login_base_url()?;
        Ok(())
    }

    /// Parses the configured repositories.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`RevwatchError::Configuration`] when no repository is
    /// configured, or [`RevwatchError::Locator`] when one is malformed.
    pub fn repository_slugs(&self) -> Result<Vec<RepositorySlug>, RevwatchError> {
        let mut slugs: Vec<RepositorySlug> = Vec::new();
        let entries = self
            .repositories
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|entry| !entry.is_empty());
        for entry in entries {
            let slug = RepositorySlug::parse(entry)?;
            if !slugs.contains(&slug) {
                slugs.push(slug);
            }
        }
        if slugs.is_empty() {
            return Err(RevwatchError::configuration(
                "at least one repository is required (use --repositories or -r)",
            ));
        }
        Ok(slugs)
    }

    /// Returns the REST API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`RevwatchError::Locator`] when the URL does not parse.
    pub fn api_base_url(&self) -> Result<Url, RevwatchError> {
        Ok(parse_base_url(
            self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE),
        )?)
    }

    /// Returns the device-flow base URL.
    ///
    /// # Errors
    ///
    /// Returns [`RevwatchError::Locator`] when the URL does not parse.
    pub fn login_base_url(&self) -> Result<Url, RevwatchError> {
        Ok(parse_base_url(
            self.login_base.as_deref().unwrap_or(DEFAULT_LOGIN_BASE),
        )?)
    }

    /// Returns the state directory, falling back to the platform data
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`RevwatchError::Configuration`] when no data directory is
    /// known or its path is not UTF-8.
    pub fn state_dir_path(&self) -> Result<Utf8PathBuf, RevwatchError> {
        if let Some(dir) = self.state_dir.as_deref() {
            return Ok(Utf8PathBuf::from(dir));
        }
        let data_dir = dirs::data_dir().ok_or_else(|| {
            RevwatchError::configuration("no data directory found; set --state-dir")
        })?;
        Utf8PathBuf::from_path_buf(data_dir.join(APP_DIR_NAME)).map_err(|path| {
            RevwatchError::configuration(format!(
                "data directory {} is not valid UTF-8; set --state-dir",
                path.display()
            ))
        })
    }

    /// Resolves the bearer token and reports where it came from.
    ///
    /// Configuration wins, then the secret store in
    /// [`AuthMethod::PREFERENCE`] order, then `GITHUB_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns [`RevwatchError::MissingToken`] when no source provides a
    /// value, or the store's error when it cannot be read.
    pub fn resolve_token(
        &self,
        store: &dyn SecretStore,
    ) -> Result<(BearerToken, TokenSource), RevwatchError> {
        if let Some(token) = self.token.as_deref() {
            return Ok((BearerToken::new(token)?, TokenSource::Configuration));
        }
        if let Some((method, token)) = store.preferred()? {
            return Ok((token, TokenSource::Stored(method)));
        }
        env::var("GITHUB_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| BearerToken::new(value).map(|token| (token, TokenSource::Environment)))
            .transpose()?
            .ok_or(RevwatchError::MissingToken)
    }

    /// Builds device-flow settings from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RevwatchError::Configuration`] when no client id is set, or
    /// [`RevwatchError::Locator`] when a base URL does not parse.
    pub fn device_flow_settings(&self) -> Result<DeviceFlowSettings, RevwatchError> {
        let client_id = self
            .client_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                RevwatchError::configuration("--login requires an OAuth client id (use --client-id)")
            })?;
        Ok(DeviceFlowSettings {
            client_id: client_id.to_owned(),
            scope: DEFAULT_SCOPE.to_owned(),
            login_base: self.login_base_url()?,
            api_base: self.api_base_url()?,
        })
    }

    /// Builds check-cycle settings from this configuration.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::repository_slugs`].
    pub fn checker_settings(&self) -> Result<CheckerSettings, RevwatchError> {
        Ok(CheckerSettings {
            repositories: self.repository_slugs()?,
            username: self
                .username
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned),
            notifications: !self.no_notifications,
        })
    }
}

#[cfg(test)]
mod tests;
