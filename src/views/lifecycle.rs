//! Mount/unmount lifecycle of a view.
//!
//! Every view owns a `ViewScope` for as long as it is mounted. Fetches run
//! through [`ViewScope::run`], which yields `None` once the scope has been
//! unmounted, so a late resolution never reaches the view's state. Identity
//! subscriptions taken by the view are parked in the scope and released on
//! unmount. Dropping the scope unmounts it.

use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::services::auth_service::Subscription;

struct ScopeInner {
    token: CancellationToken,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl ScopeInner {
    fn unmount(&self) {
        self.token.cancel();
        let released = match self.subscriptions.lock() {
            Ok(mut subscriptions) => std::mem::take(&mut *subscriptions),
            Err(_) => Vec::new(),
        };
        drop(released);
    }
}

pub struct ViewScope {
    inner: Arc<ScopeInner>,
}

impl ViewScope {
    pub fn mount() -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                token: CancellationToken::new(),
                subscriptions: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn is_mounted(&self) -> bool {
        !self.inner.token.is_cancelled()
    }

    /// Keeps `subscription` alive until the scope unmounts.
    pub fn hold(&self, subscription: Subscription) {
        // Checked under the lock: `unmount` cancels before draining.
        if let Ok(mut subscriptions) = self.inner.subscriptions.lock() {
            if self.is_mounted() {
                subscriptions.push(subscription);
            }
        }
    }

    /// Drives `fut` unless the scope unmounts first.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        let token = self.inner.token.clone();
        tokio::select! {
            biased;
            _ = token.cancelled() => None,
            output = fut => {
                // resolved in the same poll as an unmount
                if token.is_cancelled() { None } else { Some(output) }
            }
        }
    }

    #[cfg(test)]
    pub fn unmount(&self) {
        self.inner.unmount();
    }

    /// Handle that can unmount the scope from another task.
    #[cfg(test)]
    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle {
            inner: self.inner.clone(),
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.inner.unmount();
    }
}

#[cfg(test)]
#[derive(Clone)]
pub struct ScopeHandle {
    inner: Arc<ScopeInner>,
}

#[cfg(test)]
impl ScopeHandle {
    pub fn unmount(&self) {
        self.inner.unmount();
    }
}
