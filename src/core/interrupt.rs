//! A single Ctrl+C listener shared by every wait of a run

use std::future::Future;
use tokio::sync::watch;

/// Latched interrupt flag. Once the signal fires, every later `wait`
/// returns at once.
#[derive(Clone)]
pub struct Interrupt {
    pressed: watch::Receiver<bool>,
}

impl Interrupt {
    /// Listen for Ctrl+C
    pub async fn ctrl_c() -> Self {
        Self::listen(tokio::signal::ctrl_c()).await
    }

    /// Spawn a task that latches the flag when `signal` completes.
    ///
    /// The task is polled before this returns, so the signal handler is
    /// installed by the time the caller carries on.
    pub async fn listen<F>(signal: F) -> Self
    where
        F: Future<Output = std::io::Result<()>> + Send + 'static,
    {
        let (tx, pressed) = watch::channel(false);
        tokio::spawn(async move {
            match signal.await {
                Ok(()) => {
                    let _ = tx.send(true);
                }
                Err(e) => log::warn!("Unable to listen for Ctrl+C: {}", e),
            }
        });
        tokio::task::yield_now().await;
        Self { pressed }
    }

    /// Resolve once the signal has fired; never, if listening failed
    pub async fn wait(&self) {
        let mut pressed = self.pressed.clone();
        if pressed.wait_for(|p| *p).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
