use crate::error::Error;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::sync::watch;

///
/// CancelToken
///
/// Cloneable cancellation signal. Once cancelled it stays cancelled.
///

#[derive(Clone, Debug)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);

        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            // sender lives in self, so this never fires
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

///
/// CallContext
///
/// Caller-supplied deadline and cancellation for suspending calls.
///

#[derive(Clone, Debug, Default)]
pub struct CallContext {
    timeout: Option<Duration>,
    cancel: Option<CancelToken>,
}

impl CallContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Fill in a timeout only when the caller gave none.
    #[must_use]
    pub fn or_timeout(mut self, timeout: Option<Duration>) -> Self {
        if self.timeout.is_none() {
            self.timeout = timeout;
        }
        self
    }

    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Drive `fut` until it completes, the token fires, or the deadline
    /// passes. Cancellation drops `fut` without polling it again.
    pub async fn run<T, F>(&self, op: &str, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        let guarded = async {
            match &self.cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        () = token.cancelled() => Err(Error::cancelled(format!("{op} cancelled"))),
                        res = fut => res,
                    }
                }
                None => fut.await,
            }
        };

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, guarded)
                .await
                .map_err(|_| Error::cancelled(format!("{op} timed out after {limit:?}")))?,
            None => guarded.await,
        }
    }
}
