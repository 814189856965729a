//! Session ownership
//!
//! A [`Session`] holds everything one remote terminal session needs: the
//! token, the transport toggles, the screen size and the polling timings.
//! Spawning it starts the polling channel on its own task and returns a
//! [`RunningSession`] handle for feeding input and shutting down.

use std::sync::Arc;

use pollterm_protocol::SessionToken;
use pollterm_utils::{PolltermError, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Settings;
use crate::connection::{
    PollTimings, PollingChannel, SessionInput, SessionObserver, Transport, TransportConfig,
};

pub struct Session {
    token: SessionToken,
    config: TransportConfig,
    size: (u16, u16),
    timings: PollTimings,
}

impl Session {
    pub fn new(
        token: SessionToken,
        config: TransportConfig,
        size: (u16, u16),
        timings: PollTimings,
    ) -> Self {
        Self {
            token,
            config,
            size,
            timings,
        }
    }

    /// Build a session from settings, reusing the configured token or
    /// generating a fresh one
    pub fn from_settings(settings: &Settings, size: (u16, u16)) -> Self {
        let token = settings
            .session
            .clone()
            .unwrap_or_else(|| SessionToken::generate(settings.token_length));
        let config = TransportConfig::new(settings.method, settings.color, settings.cache_bust);
        Self::new(token, config, size, settings.timings)
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Start polling on a new task
    pub fn spawn<T, O>(self, transport: Arc<T>, observer: O) -> RunningSession
    where
        T: Transport,
        O: SessionObserver,
    {
        let shutdown = CancellationToken::new();
        let (channel, input) = PollingChannel::new(
            transport,
            observer,
            self.token.clone(),
            self.config.clone(),
            self.size,
            self.timings,
        );
        let handle = tokio::spawn(channel.with_shutdown(shutdown.clone()).run());
        info!(session = %self.token, cols = self.size.0, rows = self.size.1, "session started");

        RunningSession {
            token: self.token,
            config: self.config,
            input,
            shutdown,
            handle,
        }
    }
}

/// Handle to a session whose polling channel is running
pub struct RunningSession {
    token: SessionToken,
    config: TransportConfig,
    input: mpsc::UnboundedSender<SessionInput>,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl RunningSession {
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Transport toggles; changes apply from the next request
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Queue an escaped key chunk
    pub fn send_keys(&self, chunk: String) -> Result<()> {
        self.push(SessionInput::Keys(chunk))
    }

    /// Use new screen dimensions from the next request on
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        self.push(SessionInput::Resize { cols, rows })
    }

    fn push(&self, input: SessionInput) -> Result<()> {
        self.input
            .send(input)
            .map_err(|_| PolltermError::internal("polling channel has stopped"))
    }

    /// Stop polling and wait for the channel task to finish
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.cancel();
        self.handle
            .await
            .map_err(|e| PolltermError::internal(format!("polling task failed: {e}")))?;
        info!(session = %self.token, "session stopped");
        Ok(())
    }
}
