//! SIGINT/SIGTERM handling for the serve loop

use futures::stream::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::{Handle, Signals};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cancels a token on the first shutdown signal
pub struct SignalHandler {
    handle: Handle,
    task: Option<JoinHandle<()>>,
}

impl SignalHandler {
    /// Start listening; the returned handler must be kept alive
    pub fn start(cancel: CancellationToken) -> std::io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        let handle = signals.handle();

        let task = tokio::spawn(async move {
            if let Some(signal) = signals.next().await {
                let name = if signal == SIGTERM { "SIGTERM" } else { "SIGINT" };
                info!(signal = name, "shutting down");
                cancel.cancel();
            }
        });

        Ok(Self {
            handle,
            task: Some(task),
        })
    }

    pub async fn stop(mut self) {
        self.handle.close();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SignalHandler {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
