use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::feed::{FeedSession, Frame, SessionStatus};

/// Link state as seen by readers. `AwaitingData` (connected, nothing
/// received yet) and `Lost` (the socket went away) are kept apart.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Connecting {
        attempt: u32,
    },
    AwaitingData {
        since: DateTime<Utc>,
    },
    Streaming {
        last_message: DateTime<Utc>,
    },
    Lost {
        reason: String,
        attempt: u32,
        retry_at: DateTime<Utc>,
    },
    Stopped {
        reason: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LinkStatus {
    pub url: String,
    pub state: ConnectionState,
    pub connections: u64,
    pub session: Option<SessionStatus>,
}

#[derive(Debug)]
struct Shared {
    url: String,
    state: ConnectionState,
    connections: u64,
    session: Option<FeedSession>,
    frame: Option<Frame>,
}

/// Cheap clone shared by the link worker (writer), the animator and the web
/// handlers. Appends happen under the write lock, so a reader never sees a
/// half-written track entry.
#[derive(Debug, Clone)]
pub struct LinkHandle {
    shared: Arc<RwLock<Shared>>,
}

impl LinkHandle {
    pub fn new(url: &str) -> Self {
        Self {
            shared: Arc::new(RwLock::new(Shared {
                url: url.to_string(),
                state: ConnectionState::Idle,
                connections: 0,
                session: None,
                frame: None,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Shared> {
        self.shared.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Shared> {
        self.shared.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ConnectionState {
        self.read().state.clone()
    }

    pub fn set_state(&self, state: ConnectionState) {
        self.write().state = state;
    }

    pub fn status(&self) -> LinkStatus {
        let locked = self.read();
        LinkStatus {
            url: locked.url.clone(),
            state: locked.state.clone(),
            connections: locked.connections,
            session: locked.session.as_ref().map(FeedSession::status),
        }
    }

    pub fn frame(&self) -> Option<Frame> {
        self.read().frame
    }

    pub fn with_session<R>(&self, f: impl FnOnce(&FeedSession) -> R) -> Option<R> {
        self.read().session.as_ref().map(f)
    }

    pub fn with_session_mut<R>(&self, f: impl FnOnce(&mut FeedSession) -> R) -> Option<R> {
        self.write().session.as_mut().map(f)
    }

    /// Swap in the session for a freshly opened connection.
    pub fn install_session(&self, session: FeedSession) {
        let mut locked = self.write();
        locked.connections += 1;
        locked.state = ConnectionState::AwaitingData { since: Utc::now() };
        locked.frame = None;
        locked.session = Some(session);
    }

    /// Run one wire message through the current session. Decoding happens
    /// under the read lock; only the append takes the write lock.
    pub fn ingest(&self, text: &str) {
        let prepared = match self.with_session(|s| s.prepare(text)) {
            Some(prepared) => prepared,
            None => {
                log::warn!("Dropping message received without a session");
                return;
            }
        };

        let mut locked = self.write();
        let shared = &mut *locked;
        let Some(session) = shared.session.as_mut() else {
            return;
        };
        match prepared {
            Ok(prepared) => {
                let ingested = session.apply(prepared);
                if !ingested.anchored {
                    log::debug!(
                        "Sample {} appended (track length {})",
                        ingested.time,
                        ingested.track_len
                    );
                }
                shared.state = ConnectionState::Streaming {
                    last_message: Utc::now(),
                };
            }
            Err(e) => {
                session.record_rejected();
                log::warn!("Dropping sample: {}", e);
            }
        }
    }

    pub fn publish_frame(&self, frame: Frame) {
        self.write().frame = Some(frame);
    }
}
