use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

use super::lifecycle::ViewScope;
use crate::models::Identity;
use crate::router::Route;
use crate::services::auth_service::AuthClient;

#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    Allow(Identity),
    /// No identity; replace the current history entry with this route.
    Redirect(Route),
}

impl GuardOutcome {
    fn from_identity(identity: Option<Identity>) -> Self {
        match identity {
            Some(identity) => GuardOutcome::Allow(identity),
            None => GuardOutcome::Redirect(Route::SignIn),
        }
    }

    pub fn identity(self) -> Option<Identity> {
        match self {
            GuardOutcome::Allow(identity) => Some(identity),
            GuardOutcome::Redirect(_) => None,
        }
    }
}

/// Tracks the identity of a protected view for as long as it is mounted.
pub struct SessionGuard {
    identity: watch::Receiver<Option<Identity>>,
}

impl SessionGuard {
    /// Subscribes to identity changes; the subscription is parked in `scope`
    /// and released when the view unmounts.
    pub fn subscribe(session: Option<&Arc<AuthClient>>, scope: &ViewScope) -> Self {
        let (tx, mut rx) = watch::channel(None);
        if let Some(client) = session {
            let subscription = client.on_identity_change(move |identity| {
                tx.send_replace(identity.cloned());
            });
            scope.hold(subscription);
        }
        // The initial callback is the starting state, not a change.
        rx.borrow_and_update();
        Self { identity: rx }
    }

    /// One-shot query for views that do not react to later changes.
    pub fn check(session: Option<&AuthClient>) -> GuardOutcome {
        GuardOutcome::from_identity(session.and_then(|client| client.current_identity()))
    }

    pub fn outcome(&self) -> GuardOutcome {
        GuardOutcome::from_identity(self.identity.borrow().clone())
    }

    /// Waits for the next identity change. `None` once the subscription has
    /// been released (the view unmounted) or there was never a session.
    pub async fn changed(&mut self) -> Option<GuardOutcome> {
        self.identity.changed().await.ok()?;
        Some(self.outcome())
    }

    /// Drives a fetch inside `scope` and drops its result if the user signs
    /// out before it resolves.
    pub async fn run_signed_in<F: Future>(&mut self, scope: &ViewScope, fut: F) -> Option<F::Output> {
        let run = scope.run(fut);
        tokio::pin!(run);
        loop {
            tokio::select! {
                biased;
                change = self.changed() => match change {
                    Some(GuardOutcome::Allow(_)) => continue,
                    Some(GuardOutcome::Redirect(_)) => return None,
                    None => return run.await,
                },
                output = &mut run => return output,
            }
        }
    }
}
