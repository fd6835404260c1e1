//! Cancellable token stream
//!
//! A [`TokenStream`] is the consumer half of a one-token handoff between a
//! background producer task and the caller. The stream owns a drop guard on
//! its [`CancellationToken`]: dropping the stream (exhausted or abandoned)
//! cancels the token, and the producer releases its upstream connection.

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Capacity of the producer/consumer handoff channel.
pub const HANDOFF_CAPACITY: usize = 1;

/// Ordered, finite, single-consumer sequence of generated text fragments.
pub struct TokenStream {
    rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl TokenStream {
    /// Wrap the receiving end of a handoff channel. `cancel` is cancelled
    /// when the stream is dropped.
    pub fn new(rx: mpsc::Receiver<String>, cancel: CancellationToken) -> Self {
        let guard = cancel.clone().drop_guard();
        Self {
            rx,
            cancel,
            _guard: guard,
        }
    }

    /// Create a handoff channel and its stream. The sender goes to the
    /// producer task.
    pub fn channel(cancel: CancellationToken) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(HANDOFF_CAPACITY);
        (tx, Self::new(rx, cancel))
    }

    /// Token the producer watches for consumer shutdown.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Stream for TokenStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.rx.poll_recv(cx)
    }
}

impl std::fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStream")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
