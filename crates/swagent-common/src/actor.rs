//! Long-running daemon tasks and their shutdown signal.

use async_trait::async_trait;
use tokio::sync::watch;

/// A task the daemon spawns once and runs until shutdown.
///
/// # Lifecycle
///
/// 1. Construction: the actor is built with handles to the shared state it
///    drives
/// 2. `run()` is spawned on the runtime and loops over its event source
/// 3. When the [`ShutdownSignal`] fires, `run()` finishes its current step and
///    returns
#[async_trait]
pub trait Actor: Send {
    /// Returns the name of this actor (for logging).
    fn name(&self) -> &str;

    /// Runs until `shutdown` fires or the event source closes.
    async fn run(&mut self, shutdown: ShutdownSignal);
}

/// Creates a connected trigger and signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

/// Sending side of the shutdown broadcast.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Tells every signal holder to stop.
    pub fn trigger(&self) {
        // No receivers left means nobody needs telling.
        let _ = self.tx.send(true);
    }

    /// Returns a new signal attached to this trigger.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving side of the shutdown broadcast. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Returns true once shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes when shutdown is requested or the trigger is dropped.
    pub async fn wait(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
