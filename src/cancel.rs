//! Cancellation tokens for blocking waits.
//!
//! A [`CancellationSource`] owns the sending half of a zero-capacity channel
//! that never carries a message. Cancelling drops that sender, which
//! disconnects every cloned receiver at once. A disconnected receiver is
//! always ready in `select!`, so tokens compose with subscription queues
//! without polling.
//!
//! Tokens share the sender slot with their source, so only [`cancel`]
//! fires the signal. Dropping the source does not.
//!
//! [`cancel`]: CancellationSource::cancel

use crossbeam_channel::{at, bounded, never, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sender slot shared by a source and its tokens. Emptied by `cancel`.
type Trigger = Arc<Mutex<Option<Sender<()>>>>;

/// Owner side of a cancellation signal.
#[derive(Debug)]
pub struct CancellationSource {
    trigger: Trigger,
    token: CancellationToken,
}

impl CancellationSource {
    /// Create a source that has not fired yet.
    pub fn new() -> Self {
        let (sender, signal) = bounded(0);
        let trigger: Trigger = Arc::new(Mutex::new(Some(sender)));
        Self {
            token: CancellationToken {
                signal,
                _trigger: Some(Arc::clone(&trigger)),
                deadline: None,
            },
            trigger,
        }
    }

    /// A token observing this source.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Fire the signal. Later calls do nothing.
    pub fn cancel(&self) {
        self.trigger.lock().take();
    }

    /// True once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.trigger.lock().is_none()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of a cancellation signal, optionally with a deadline.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    signal: Receiver<()>,
    /// Keeps the sender alive after the source is dropped.
    _trigger: Option<Trigger>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// A token that never fires.
    pub fn none() -> Self {
        Self {
            signal: never(),
            _trigger: None,
            deadline: None,
        }
    }

    /// A token that fires once `timeout` has elapsed.
    pub fn timeout(timeout: Duration) -> Self {
        Self::none().with_timeout(timeout)
    }

    /// Same signal, additionally firing after `timeout`. An earlier
    /// deadline already on the token is kept.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// True once the source was cancelled or the deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return true;
        }
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// The instant this token times out, if it has a deadline.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Receiver that disconnects when the source is cancelled.
    pub(crate) fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::none()
    }
}

/// Receiver that fires at the earliest deadline of `tokens`, or never.
pub(crate) fn earliest_deadline(tokens: &[&CancellationToken]) -> Receiver<Instant> {
    match tokens.iter().filter_map(|t| t.deadline).min() {
        Some(deadline) => at(deadline),
        None => never(),
    }
}
