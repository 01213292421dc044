//! OAuth device authorization flow against GitHub.
//!
//! The flow requests a device code, shows the user code to the user, then
//! polls the token endpoint until GitHub answers with a token or a terminal
//! error. States move forward only:
//!
//! `RequestingCode -> CodeReady -> WaitingForAuthorization -> terminal`
//!
//! where the terminal state is one of `Success`, `Expired`, `Denied`,
//! `Cancelled` or `Error`. The poll interval never decreases for one grant.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use super::error::DeviceFlowError;
use crate::github::locator::BearerToken;

/// Default host for device-flow endpoints.
pub const DEFAULT_LOGIN_BASE: &str = "https://github.com";

/// Scopes requested by default.
pub const DEFAULT_SCOPE: &str = "repo read:org";

const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
const GITHUB_V3_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const SLOW_DOWN_STEP_SECS: u64 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("revwatch/", env!("CARGO_PKG_VERSION"));

/// Where the flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFlowState {
    /// Asking GitHub for a device code.
    RequestingCode,
    /// A code was issued and can be shown to the user.
    CodeReady,
    /// Polling for the user's decision.
    WaitingForAuthorization,
    /// A token was issued.
    Success,
    /// The code expired before the user decided.
    Expired,
    /// The user declined.
    Denied,
    /// The flow was cancelled locally.
    Cancelled,
    /// GitHub reported an unrecoverable error.
    Error,
}

/// A device code issued by GitHub.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceCodeGrant {
    device_code: String,
    /// Code the user types at the verification page.
    pub user_code: String,
    /// Page where the user enters the code.
    pub verification_uri: String,
    /// Seconds until the code expires.
    pub expires_in: u64,
    /// Minimum seconds between polls.
    #[serde(default = "default_interval_secs")]
    pub interval: u64,
}

const fn default_interval_secs() -> u64 {
    SLOW_DOWN_STEP_SECS
}

impl fmt::Debug for DeviceCodeGrant {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DeviceCodeGrant")
            .field("device_code", &"..")
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field("expires_in", &self.expires_in)
            .field("interval", &self.interval)
            .finish()
    }
}

/// Seconds to wait between polls; only ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PollInterval(u64);

impl PollInterval {
    /// Creates an interval of `seconds`, at least one second.
    #[must_use]
    pub fn from_secs(seconds: u64) -> Self {
        Self(seconds.max(1))
    }

    /// Current interval in seconds.
    #[must_use]
    pub const fn secs(self) -> u64 {
        self.0
    }

    /// Current interval as a duration.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }

    /// Applies a `slow_down` response: grows by five seconds, or to the
    /// server's interval when that is larger.
    #[must_use]
    pub fn slowed_down(self, server_interval: Option<u64>) -> Self {
        let stepped = self.0.saturating_add(SLOW_DOWN_STEP_SECS);
        Self(server_interval.map_or(stepped, |server| server.max(stepped)))
    }
}

/// How the flow ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceFlowOutcome {
    /// The user authorised the app.
    Success {
        /// Issued access token.
        token: BearerToken,
        /// Login of the user the token belongs to.
        login: String,
    },
    /// The code expired.
    Expired,
    /// The user declined.
    Denied,
    /// The flow was cancelled locally.
    Cancelled,
    /// An unrecoverable error occurred.
    Error {
        /// Description of the failure.
        message: String,
    },
}

impl DeviceFlowOutcome {
    /// Whether starting a new flow makes sense after this outcome.
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        matches!(self, Self::Expired | Self::Cancelled | Self::Error { .. })
    }

    /// Terminal state matching this outcome.
    #[must_use]
    pub const fn state(&self) -> DeviceFlowState {
        match self {
            Self::Success { .. } => DeviceFlowState::Success,
            Self::Expired => DeviceFlowState::Expired,
            Self::Denied => DeviceFlowState::Denied,
            Self::Cancelled => DeviceFlowState::Cancelled,
            Self::Error { .. } => DeviceFlowState::Error,
        }
    }
}

/// Endpoints and client registration for the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFlowSettings {
    /// OAuth app client id.
    pub client_id: String,
    /// Space-separated scopes.
    pub scope: String,
    /// Base URL of the login host (`https://github.com`).
    pub login_base: Url,
    /// Base URL of the REST API, used to resolve the user's login.
    pub api_base: Url,
}

/// Runs one device authorization.
///
/// Cancellation is permanent for an instance; start a new flow to retry.
pub struct DeviceAuthFlow {
    http: Client,
    settings: DeviceFlowSettings,
    state: Mutex<DeviceFlowState>,
    cancel: watch::Sender<bool>,
}

impl DeviceAuthFlow {
    /// Creates a flow in the `RequestingCode` state.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceFlowError::Configuration`] when the client id is blank
    /// or the HTTP client cannot be built.
    pub fn new(settings: DeviceFlowSettings) -> Result<Self, DeviceFlowError> {
        if settings.client_id.trim().is_empty() {
            return Err(DeviceFlowError::Configuration {
                message: "an OAuth client id is required (use --client-id or REVWATCH_CLIENT_ID)"
                    .to_owned(),
            });
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| DeviceFlowError::Configuration {
                message: format!("failed to configure HTTP client: {error}"),
            })?;
        let (cancel, _) = watch::channel(false);
        Ok(Self {
            http,
            settings,
            state: Mutex::new(DeviceFlowState::RequestingCode),
            cancel,
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> DeviceFlowState {
        self.state
            .lock()
            .map_or(DeviceFlowState::Error, |state| *state)
    }

    /// Cancels the flow, interrupting any wait between polls.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    fn set_state(&self, next: DeviceFlowState) {
        if let Ok(mut state) = self.state.lock() {
            debug!(from = ?*state, to = ?next, "device flow state change");
            *state = next;
        }
    }

    fn login_endpoint(&self, path: &str) -> String {
        format!(
            "{}/{path}",
            self.settings.login_base.as_str().trim_end_matches('/')
        )
    }

    /// Requests a device code.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceFlowError`] when the flow was cancelled or GitHub does
    /// not issue a code.
    pub async fn request_code(&self) -> Result<DeviceCodeGrant, DeviceFlowError> {
        if self.is_cancelled() {
            self.set_state(DeviceFlowState::Cancelled);
            return Err(DeviceFlowError::Cancelled);
        }
        self.set_state(DeviceFlowState::RequestingCode);

        let response = self
            .http
            .post(self.login_endpoint("login/device/code"))
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.settings.client_id.as_str()),
                ("scope", self.settings.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|error| {
                self.set_state(DeviceFlowState::Error);
                DeviceFlowError::Network {
                    message: error.to_string(),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            self.set_state(DeviceFlowState::Error);
            DeviceFlowError::Network {
                message: error.to_string(),
            }
        })?;

        let parsed = decode_code_response(status, &body);
        match &parsed {
            Ok(grant) => {
                info!(
                    verification_uri = %grant.verification_uri,
                    expires_in = grant.expires_in,
                    "device code issued"
                );
                self.set_state(DeviceFlowState::CodeReady);
            }
            Err(error) => {
                warn!(%error, "device code request failed");
                self.set_state(DeviceFlowState::Error);
            }
        }
        parsed
    }

    /// Polls until the user decides, the code expires, or the flow is
    /// cancelled.
    pub async fn wait_for_authorization(&self, grant: &DeviceCodeGrant) -> DeviceFlowOutcome {
        self.set_state(DeviceFlowState::WaitingForAuthorization);
        let outcome = self.poll_until_terminal(grant).await;
        self.set_state(outcome.state());
        outcome
    }

    async fn poll_until_terminal(&self, grant: &DeviceCodeGrant) -> DeviceFlowOutcome {
        // An expiry too far out to represent leaves the wait unbounded.
        let deadline = Instant::now().checked_add(Duration::from_secs(grant.expires_in));
        let mut interval = PollInterval::from_secs(grant.interval);
        let mut cancel = self.cancel.subscribe();

        loop {
            if *cancel.borrow_and_update() {
                return DeviceFlowOutcome::Cancelled;
            }
            tokio::select! {
                () = tokio::time::sleep(interval.as_duration()) => {}
                _ = cancel.changed() => {}
            }
            if *cancel.borrow_and_update() {
                return DeviceFlowOutcome::Cancelled;
            }
            if deadline.is_some_and(|limit| Instant::now() >= limit) {
                return DeviceFlowOutcome::Expired;
            }

            match self.poll_token(grant).await {
                TokenPoll::Token(token) => return self.complete(token).await,
                TokenPoll::Pending => {}
                TokenPoll::SlowDown(server_interval) => {
                    interval = interval.slowed_down(server_interval);
                    debug!(seconds = interval.secs(), "device flow asked to slow down");
                }
                TokenPoll::Expired => return DeviceFlowOutcome::Expired,
                TokenPoll::Denied => return DeviceFlowOutcome::Denied,
                TokenPoll::Failed(message) => return DeviceFlowOutcome::Error { message },
                TokenPoll::Transient(message) => {
                    debug!(%message, "transient device flow poll failure");
                }
            }
        }
    }

    async fn poll_token(&self, grant: &DeviceCodeGrant) -> TokenPoll {
        let sent = self
            .http
            .post(self.login_endpoint("login/oauth/access_token"))
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.settings.client_id.as_str()),
                ("device_code", grant.device_code.as_str()),
                ("grant_type", DEVICE_GRANT_TYPE),
            ])
            .send()
            .await;
        let response = match sent {
            Ok(response) => response,
            Err(error) => return TokenPoll::Transient(error.to_string()),
        };
        let status = response.status();
        match response.text().await {
            Ok(body) => classify_token_response(status, &body),
            Err(error) => TokenPoll::Transient(error.to_string()),
        }
    }

    async fn complete(&self, token: BearerToken) -> DeviceFlowOutcome {
        if self.is_cancelled() {
            return DeviceFlowOutcome::Cancelled;
        }
        match self.fetch_login(&token).await {
            Ok(login) => {
                info!(%login, "device flow authorised");
                DeviceFlowOutcome::Success { token, login }
            }
            Err(message) => DeviceFlowOutcome::Error { message },
        }
    }

    async fn fetch_login(&self, token: &BearerToken) -> Result<String, String> {
        let endpoint = format!(
            "{}/user",
            self.settings.api_base.as_str().trim_end_matches('/')
        );
        let response = self
            .http
            .get(endpoint)
            .bearer_auth(token.value())
            .header(ACCEPT, GITHUB_V3_MEDIA_TYPE)
            .send()
            .await
            .map_err(|error| format!("could not load the authorised user: {error}"))?;
        if !response.status().is_success() {
            return Err(format!(
                "could not load the authorised user: status {}",
                response.status().as_u16()
            ));
        }
        let user: ApiLogin = response
            .json()
            .await
            .map_err(|error| format!("authorised user response could not be decoded: {error}"))?;
        Ok(user.login)
    }
}

#[derive(Debug, Deserialize)]
struct ApiLogin {
    login: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiOAuthResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
    interval: Option<u64>,
}

#[derive(Debug, PartialEq, Eq)]
enum TokenPoll {
    Token(BearerToken),
    Pending,
    SlowDown(Option<u64>),
    Expired,
    Denied,
    Failed(String),
    Transient(String),
}

fn decode_code_response(status: StatusCode, body: &str) -> Result<DeviceCodeGrant, DeviceFlowError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ApiOAuthResponse>(body)
            .ok()
            .and_then(|error| error.error_description.or(error.error))
            .unwrap_or_else(|| body.trim().to_owned());
        return Err(DeviceFlowError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    if let Ok(ApiOAuthResponse {
        error: Some(error),
        error_description,
        ..
    }) = serde_json::from_str::<ApiOAuthResponse>(body)
    {
        return Err(DeviceFlowError::Rejected {
            status: status.as_u16(),
            message: error_description.unwrap_or(error),
        });
    }
    serde_json::from_str(body).map_err(|error| DeviceFlowError::Decode {
        message: error.to_string(),
    })
}

fn classify_token_response(status: StatusCode, body: &str) -> TokenPoll {
    let http_error = status.is_client_error() || status.is_server_error();
    let Ok(parsed) = serde_json::from_str::<ApiOAuthResponse>(body) else {
        return if http_error {
            TokenPoll::Failed(format!("token request failed with status {}", status.as_u16()))
        } else {
            TokenPoll::Transient("token response could not be decoded".to_owned())
        };
    };

    if let Some(token) = parsed
        .access_token
        .as_deref()
        .and_then(|value| BearerToken::new(value).ok())
    {
        return TokenPoll::Token(token);
    }

    match parsed.error.as_deref() {
        Some("authorization_pending") => TokenPoll::Pending,
        Some("slow_down") => TokenPoll::SlowDown(parsed.interval),
        Some("expired_token") => TokenPoll::Expired,
        Some("access_denied") => TokenPoll::Denied,
        other => {
            let message = parsed
                .error_description
                .or_else(|| other.map(ToOwned::to_owned))
                .unwrap_or_else(|| "token response had neither token nor error".to_owned());
            if http_error {
                TokenPoll::Failed(message)
            } else {
                TokenPoll::Transient(message)
            }
        }
    }
}
