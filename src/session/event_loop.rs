use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::info;

use super::{Session, SessionEvent};
use crate::dom::SnapshotPage;

/// Bound of the channel feeding the loop; readers block when the session lags.
pub const SESSION_QUEUE_CAPACITY: usize = 256;

/// Drain `events` one at a time until shutdown or until every sender is gone.
///
/// Blocks on the channel, waking early only for the next timer deadline.
/// `after_event` runs after every wake-up so the caller can flush page side
/// effects to the host.
pub fn run_event_loop<P, F>(
    session: &mut Session<P>,
    events: &Receiver<SessionEvent>,
    mut after_event: F,
) where
    P: SnapshotPage,
    F: FnMut(&mut Session<P>),
{
    loop {
        let received = match session.next_deadline() {
            Some(deadline) => events.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => events.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(event) => {
                if !session.handle(event, Instant::now()) {
                    after_event(session);
                    info!("session shut down");
                    return;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                session.cleanup();
                after_event(session);
                info!("event channel closed");
                return;
            }
        }
        session.poll_timers(Instant::now());
        after_event(session);
    }
}
