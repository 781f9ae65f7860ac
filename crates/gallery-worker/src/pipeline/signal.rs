//! Once-resolved broadcast of the staged upload path.
//!
//! The stage step resolves the signal exactly once, either with the staged
//! path or as cancelled. Any number of consumers wait on it; each wait
//! observes the resolved value no matter whether it started before or after
//! resolution. A signal dropped without resolving counts as cancelled.

use std::path::PathBuf;

use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
enum StageStatus {
    Pending,
    Ready(PathBuf),
    Cancelled,
}

/// Producer side, owned by the stage step.
#[derive(Debug)]
pub struct StageSignal {
    tx: watch::Sender<StageStatus>,
}

/// Consumer side. Cloned once per derivative task.
#[derive(Debug, Clone)]
pub struct StageWatcher {
    rx: watch::Receiver<StageStatus>,
}

impl StageSignal {
    pub fn new() -> (Self, StageWatcher) {
        let (tx, rx) = watch::channel(StageStatus::Pending);
        (Self { tx }, StageWatcher { rx })
    }

    /// Publish the staged path. Ignored if already resolved.
    pub fn ready(&self, path: PathBuf) {
        self.resolve(StageStatus::Ready(path));
    }

    /// Cancel every waiter. Ignored if already resolved.
    pub fn cancel(&self) {
        self.resolve(StageStatus::Cancelled);
    }

    fn resolve(&self, status: StageStatus) {
        self.tx.send_if_modified(|current| {
            if *current == StageStatus::Pending {
                *current = status;
                true
            } else {
                false
            }
        });
    }
}

impl StageWatcher {
    /// Wait until the stage resolves. `Some(path)` when staged, `None` when
    /// cancelled.
    pub async fn wait(mut self) -> Option<PathBuf> {
        let resolved = self
            .rx
            .wait_for(|status| *status != StageStatus::Pending)
            .await;
        match resolved {
            Ok(status) => match &*status {
                StageStatus::Ready(path) => Some(path.clone()),
                _ => None,
            },
            Err(_) => None,
        }
    }
}
