//! coop-client - headless session runner.
//!
//! Resumes the stored session, opens the real-time channel, loads the
//! thread list and logs activity until interrupted.

use std::sync::Arc;
use std::time::Duration;

use coop_client::adapters::FileCredentialStore;
use coop_client::application::{ClientSession, SessionError};
use coop_client::config::ClientConfig;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How often the credential file is re-read for changes made elsewhere.
const CREDENTIAL_RELOAD_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::load()?;
    config.validate()?;
    init_tracing(&config);

    info!(api = %config.api.base_url(), "starting coop-client");

    let credentials = Arc::new(FileCredentialStore::open(&config.storage.credentials_path).await?);
    let session = match ClientSession::restore(&config, credentials.clone()).await {
        Ok(session) => session,
        Err(SessionError::NotSignedIn) => {
            error!(
                path = %credentials.path().display(),
                "no stored session; sign in to create one"
            );
            return Err(SessionError::NotSignedIn.into());
        }
        Err(e) => return Err(e.into()),
    };

    let state = session.start().await;
    info!(user_id = %session.user().id, ?state, "session started");

    if let Err(e) = session.refresh_contacts().await {
        warn!(error = %e, "could not load contacts, names may show as placeholders");
    }
    session.messaging().fetch_threads().await?;
    info!(
        threads = session.messaging().threads().await.len(),
        unread = session.messaging().total_unread().await,
        "threads loaded"
    );

    let reload = {
        let credentials = Arc::clone(&credentials);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(CREDENTIAL_RELOAD_INTERVAL);
            loop {
                ticker.tick().await;
                match credentials.reload().await {
                    Ok(true) => info!("credential file changed on disk"),
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "failed to reload credential file"),
                }
            }
        })
    };

    let mut states = session.messaging().transport().watch_state();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, shutting down");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                info!(?state, unread = session.messaging().total_unread().await, "real-time state changed");
            }
        }
    }

    reload.abort();
    session.dispose().await;
    Ok(())
}

fn init_tracing(config: &ClientConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.api.log_level));

    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
