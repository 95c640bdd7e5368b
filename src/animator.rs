use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::link::LinkHandle;

/// Render tick. Advances the live session's clock by the measured wall time
/// and publishes the interpolated frame for readers.
pub struct Animator {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl Animator {
    pub fn spawn(link: LinkHandle, tick: Duration) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_animator(link, tick, stop_rx));
        Self { stop_tx, join }
    }

    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.join.await;
    }
}

async fn run_animator(link: LinkHandle, tick: Duration, mut stop_rx: oneshot::Receiver<()>) {
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut stop_rx => break,
        }

        let now = Instant::now();
        let elapsed = now - last;
        last = now;

        if let Some(frame) = link.with_session_mut(|s| s.advance(elapsed)) {
            link.publish_frame(frame);
        }
    }
}
