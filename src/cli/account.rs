//! Sign-in and sign-out.
//!
//! `--login` stores a personal access token when one is configured and runs
//! the device flow otherwise.

use std::io::{self, Write};
use std::sync::Arc;

use revwatch::auth::{AuthMethod, DeviceAuthFlow, DeviceFlowOutcome, SecretStore};
use revwatch::{BearerToken, OctocrabReviewGateway, ReviewGateway, RevwatchConfig, RevwatchError};
use tracing::info;

use super::open_secret_store;
use super::output::write_device_prompt_to;

/// Signs in and stores the resulting token.
///
/// A configured token is verified and stored as a personal access token.
/// Without one the device flow runs; Ctrl-C cancels it at any point.
///
/// # Errors
///
/// Returns [`RevwatchError::Check`] when a configured token is rejected,
/// [`RevwatchError::Configuration`] when no client id is set,
/// [`RevwatchError::DeviceFlow`] when no code could be obtained, and
/// [`RevwatchError::SignIn`] when the flow ends without a token.
pub async fn login(config: &RevwatchConfig) -> Result<(), RevwatchError> {
    let store = open_secret_store(config)?;
    if let Some(token) = config.token.as_deref() {
        let login = store_personal_token(config, &store, token).await?;
        writeln!(io::stdout().lock(), "Signed in as {login}.")?;
        return Ok(());
    }

    let flow = Arc::new(DeviceAuthFlow::new(config.device_flow_settings()?)?);

    let canceller = Arc::clone(&flow);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    let outcome = match flow.request_code().await {
        Ok(grant) => {
            write_device_prompt_to(&mut io::stdout().lock(), &grant)?;
            flow.wait_for_authorization(&grant).await
        }
        Err(error) => {
            interrupt.abort();
            return Err(error.into());
        }
    };
    interrupt.abort();

    match outcome {
        DeviceFlowOutcome::Success { token, login } => {
            store.set(AuthMethod::DeviceFlow, &token)?;
            info!(login = %login, "stored device-flow token");
            writeln!(io::stdout().lock(), "Signed in as {login}.")?;
            Ok(())
        }
        other => Err(RevwatchError::SignIn {
            message: describe_failure(&other),
        }),
    }
}

/// Verifies `token` against `GET /user` and stores it under
/// [`AuthMethod::PersonalAccessToken`], returning the account login.
async fn store_personal_token(
    config: &RevwatchConfig,
    store: &dyn SecretStore,
    token: &str,
) -> Result<String, RevwatchError> {
    let token = BearerToken::new(token)?;
    let gateway = OctocrabReviewGateway::for_token(&token, &config.api_base_url()?)?;
    let user = gateway.authenticated_user().await?;
    store.set(AuthMethod::PersonalAccessToken, &token)?;
    info!(login = %user.login, "stored personal access token");
    Ok(user.login)
}

fn describe_failure(outcome: &DeviceFlowOutcome) -> String {
    let reason = match outcome {
        DeviceFlowOutcome::Success { .. } => "signed in".to_owned(),
        DeviceFlowOutcome::Expired => "the code expired".to_owned(),
        DeviceFlowOutcome::Denied => "access was denied".to_owned(),
        DeviceFlowOutcome::Cancelled => "cancelled".to_owned(),
        DeviceFlowOutcome::Error { message } => message.clone(),
    };
    if outcome.can_retry() {
        format!("{reason}; run --login to try again")
    } else {
        reason
    }
}

/// Deletes every stored token.
///
/// # Errors
///
/// Returns [`RevwatchError::SecretStore`] when the store cannot be updated.
pub fn logout(config: &RevwatchConfig) -> Result<(), RevwatchError> {
    let store = open_secret_store(config)?;
    let mut removed = Vec::new();
    for method in AuthMethod::PREFERENCE {
        if store.delete(method)? {
            removed.push(method.as_str());
        }
    }

    let mut stdout = io::stdout().lock();
    if removed.is_empty() {
        writeln!(stdout, "No stored tokens.")?;
    } else {
        info!(methods = ?removed, "deleted stored tokens");
        writeln!(stdout, "Removed stored tokens: {}.", removed.join(", "))?;
    }
    Ok(())
}
