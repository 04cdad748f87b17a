//! Background persistence writer
//!
//! Slice writes are handed to a single tokio task over an unbounded channel.
//! Submitting never blocks the dispatcher and never reports failure to it;
//! failed writes are logged and dropped. Because one task applies writes in
//! submission order, a later write for a key always lands after an earlier
//! one and supersedes it.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::storage::Storage;
use super::PendingWrite;

enum WriteCommand {
    Put(PendingWrite),
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task
///
/// The task exits once every handle has been dropped and the queue is empty.
#[derive(Clone)]
pub struct PersistWriter {
    sender: mpsc::UnboundedSender<WriteCommand>,
}

impl PersistWriter {
    /// Spawn the writer task on the current tokio runtime
    pub fn spawn(storage: Arc<dyn Storage>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run(storage, receiver));
        Self { sender }
    }

    /// Queue a write; fire-and-forget
    pub fn submit(&self, write: PendingWrite) {
        if self.sender.send(WriteCommand::Put(write)).is_err() {
            tracing::warn!("Persist writer has stopped; dropping slice write");
        }
    }

    /// Wait until every write submitted before this call has been attempted
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(WriteCommand::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

async fn run(storage: Arc<dyn Storage>, mut receiver: mpsc::UnboundedReceiver<WriteCommand>) {
    while let Some(command) = receiver.recv().await {
        match command {
            WriteCommand::Put(write) => {
                match storage.set_item(write.key, &write.value).await {
                    Ok(()) => tracing::debug!(
                        slice = write.key,
                        backend = storage.backend_name(),
                        "Persisted slice"
                    ),
                    Err(e) => tracing::warn!(
                        slice = write.key,
                        backend = storage.backend_name(),
                        error = %e,
                        "Failed to persist slice"
                    ),
                }
            }
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::trace!("Persist writer stopped");
}
