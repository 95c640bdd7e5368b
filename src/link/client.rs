use chrono::Utc;
use futures::StreamExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::backoff::Backoff;
use super::error::LinkError;
use super::state::{ConnectionState, LinkHandle};
use crate::config::FeedConfig;
use crate::feed::{FeedSession, FeedSettings};

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<Result<(), LinkError>>,
}

/// Websocket client that keeps one [`FeedSession`] per connection alive and
/// reconnects with backoff when the producer goes away.
pub struct FeedLink {
    config: FeedConfig,
    settings: FeedSettings,
    handle: LinkHandle,
    worker: Option<WorkerHandle>,
}

impl FeedLink {
    pub fn new(config: FeedConfig, settings: FeedSettings) -> Self {
        let handle = LinkHandle::new(&config.url);
        Self {
            config,
            settings,
            handle,
            worker: None,
        }
    }

    pub fn handle(&self) -> LinkHandle {
        self.handle.clone()
    }

    pub fn run(&mut self) -> Result<(), LinkError> {
        if self.worker.is_some() {
            return Err(LinkError::AlreadyRunning);
        }

        let handle = self.handle.clone();
        let config = self.config.clone();
        let settings = self.settings;
        let (stop_tx, stop_rx) = oneshot::channel();

        let join = tokio::spawn(run_link_loop(handle, config, settings, stop_rx));
        self.worker = Some(WorkerHandle { stop_tx, join });
        Ok(())
    }

    pub async fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
        }
        self.handle.set_state(ConnectionState::Stopped { reason: None });
    }

    /// Wait for the worker to finish on its own, i.e. after running out of
    /// reconnect attempts.
    #[cfg(test)]
    pub async fn wait(&mut self) -> Result<(), LinkError> {
        match self.worker.take() {
            Some(worker) => worker
                .join
                .await
                .map_err(|e| LinkError::Worker(e.to_string()))?,
            None => Ok(()),
        }
    }
}

async fn run_link_loop(
    link: LinkHandle,
    config: FeedConfig,
    settings: FeedSettings,
    mut stop_rx: oneshot::Receiver<()>,
) -> Result<(), LinkError> {
    let backoff = Backoff::from(&config.reconnect);
    let mut failures: u32 = 0;

    loop {
        link.set_state(ConnectionState::Connecting {
            attempt: failures + 1,
        });

        let result = tokio::select! {
            result = connect_and_stream(&link, &config, settings) => result,
            _ = &mut stop_rx => {
                link.set_state(ConnectionState::Stopped { reason: None });
                return Ok(());
            }
        };

        let err = match result {
            Ok(()) => LinkError::Closed,
            Err(e) => e,
        };
        failures = if err.is_connect_failure() {
            failures + 1
        } else {
            1
        };

        if let Some(max) = config.reconnect.max_attempts {
            if failures >= max {
                log::error!("Giving up on {} after {} attempts: {}", config.url, failures, err);
                link.set_state(ConnectionState::Stopped {
                    reason: Some(err.to_string()),
                });
                return Err(LinkError::RetriesExhausted(failures));
            }
        }

        let delay = backoff.delay(failures);
        let retry_at = Utc::now() + chrono::Duration::from_std(delay).unwrap_or_default();
        log::warn!(
            "Feed {} lost ({}); retry {} in {:?}",
            config.url,
            err,
            failures,
            delay
        );
        link.set_state(ConnectionState::Lost {
            reason: err.to_string(),
            attempt: failures,
            retry_at,
        });

        let should_stop = tokio::select! {
            _ = sleep(delay) => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            link.set_state(ConnectionState::Stopped { reason: None });
            return Ok(());
        }
    }
}

/// Returns `Ok` when the producer ends the stream cleanly.
async fn connect_and_stream(
    link: &LinkHandle,
    config: &FeedConfig,
    settings: FeedSettings,
) -> Result<(), LinkError> {
    let (mut ws, _response) = timeout(config.connect_timeout, connect_async(config.url.as_str()))
        .await
        .map_err(|_| LinkError::ConnectTimeout(config.connect_timeout))?
        .map_err(|e| LinkError::Connect(e.to_string()))?;

    let session = FeedSession::new(settings, Utc::now());
    log::info!("Connected to {} (session {})", config.url, session.id());
    link.install_session(session);

    while let Some(message) = ws.next().await {
        match message.map_err(|e| LinkError::Stream(e.to_string()))? {
            Message::Text(text) => link.ingest(text.as_str()),
            Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => link.ingest(text),
                Err(_) => {
                    link.with_session_mut(FeedSession::record_rejected);
                    log::warn!("Dropping binary frame that is not UTF-8");
                }
            },
            Message::Close(frame) => {
                log::info!("Producer closed the feed: {:?}", frame);
                break;
            }
            _ => {}
        }
    }

    Ok(())
}
