use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancellation owner of one consuming view.
///
/// Calls started on behalf of the view take a token from [`ViewScope::token`].
/// Closing or dropping the scope cancels all of them, and values that arrive
/// afterwards are discarded instead of delivered.
#[derive(Debug)]
pub struct ViewScope {
    name: String,
    token: CancellationToken,
}

impl ViewScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: CancellationToken::new(),
        }
    }

    /// A scope that also closes when `parent` is cancelled.
    pub fn child_of(name: impl Into<String>, parent: &CancellationToken) -> Self {
        Self {
            name: name.into(),
            token: parent.child_token(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token for one call bound to this scope.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn close(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!(scope = %self.name, "Closing view scope");
            self.token.cancel();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Await `fut` and hand back its value only if the scope is still open.
    pub async fn deliver<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            value = fut => (!self.token.is_cancelled()).then_some(value),
        }
    }

    /// Run `fut` in the background; the task yields `None` when the scope
    /// closes first.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<Option<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let token = self.token.clone();
        let name = self.name.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!(scope = %name, "Dropping result of closed view scope");
                    None
                }
                value = fut => Some(value),
            }
        })
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.close();
    }
}
