use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use medtrack_core::UserId;
use medtrack_events::{EventBus, Subscription, UserScoped};

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Generic event worker loop.
///
/// - Subscribes to an event bus
/// - Applies a handler for each message
/// - Supports graceful shutdown
/// - Optional user filtering for safe initialization
///
/// Handler failures are logged and the loop continues: the message's
/// originating state change already committed on the publisher's side, so
/// the failure must be observable but must not propagate back to the
/// original caller.
#[derive(Debug)]
pub struct EventWorker;

impl EventWorker {
    /// Spawn a worker thread that processes events from the bus subscription.
    ///
    /// - `user_id`: when provided, messages for other users are ignored
    /// - `handler`: must tolerate redelivery (at-least-once delivery safe)
    pub fn spawn<M, B, H, E>(
        name: &'static str,
        bus: B,
        user_id: Option<UserId>,
        mut handler: H,
    ) -> WorkerHandle
    where
        M: UserScoped + Send + 'static,
        B: EventBus<M> + Send + Sync + 'static,
        H: FnMut(M) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<M> = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, user_id, &mut handler))
            .expect("failed to spawn event worker thread");

        WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

fn worker_loop<M, H, E>(
    name: &'static str,
    sub: Subscription<M>,
    shutdown_rx: mpsc::Receiver<()>,
    user_id: Option<UserId>,
    handler: &mut H,
) where
    M: UserScoped,
    H: FnMut(M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let tick = Duration::from_millis(250);

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(msg) => {
                if let Some(u) = user_id {
                    if msg.user_id() != u {
                        // Pinned worker: ignore other users.
                        continue;
                    }
                }

                if let Err(err) = handler(msg) {
                    warn!(worker = name, error = ?err, "event worker handler failed");
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}
