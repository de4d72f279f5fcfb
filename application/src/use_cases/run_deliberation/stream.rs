//! Event stream plumbing between the driving task and its consumer.

use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use council_domain::DeliberationEvent;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity of the event channel
pub(super) const EVENT_BUFFER: usize = 64;

/// The consumer went away; the driving task should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Disconnected;

/// Sends events to the consumer and mirrors them to the transcript logger.
pub(super) struct EventEmitter {
    tx: mpsc::Sender<DeliberationEvent>,
    logger: Option<Arc<dyn ConversationLogger>>,
}

impl EventEmitter {
    pub(super) fn new(
        tx: mpsc::Sender<DeliberationEvent>,
        logger: Option<Arc<dyn ConversationLogger>>,
    ) -> Self {
        Self { tx, logger }
    }

    pub(super) async fn emit(&self, event: DeliberationEvent) -> Result<(), Disconnected> {
        if let Some(logger) = &self.logger {
            logger.log(ConversationEvent::from(&event));
        }
        self.tx.send(event).await.map_err(|_| Disconnected)
    }
}

/// Ordered stream of [`DeliberationEvent`]s for one turn.
///
/// The turn runs on a spawned task; dropping the stream stops it at its next
/// emitted event.
pub struct DeliberationStream {
    rx: mpsc::Receiver<DeliberationEvent>,
    task: JoinHandle<()>,
}

impl DeliberationStream {
    pub(super) fn new(rx: mpsc::Receiver<DeliberationEvent>, task: JoinHandle<()>) -> Self {
        Self { rx, task }
    }

    /// Whether the driving task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Stream for DeliberationStream {
    type Item = DeliberationEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for DeliberationStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}
