//! Change notification
//!
//! Observers subscribe to a [`ContentUri`] and are told when the data behind
//! it changed. The event carries no payload; observers re-query.
//!
//! An observer registered on `U` receives a notification for `N` when:
//! - `U == N`
//! - `N` is an ancestor of `U` (a change to `/book` touches `/book/5`)
//! - `U` is an ancestor of `N` and the observer asked for descendants

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::uri::ContentUri;

/// Receives change events.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, uri: &ContentUri) -> anyhow::Result<()>;
}

impl<F> ChangeObserver for F
where
    F: Fn(&ContentUri) -> anyhow::Result<()> + Send + Sync,
{
    fn on_change(&self, uri: &ContentUri) -> anyhow::Result<()> {
        self(uri)
    }
}

/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct Registration {
    id: ObserverId,
    uri: ContentUri,
    descendants: bool,
    observer: Arc<dyn ChangeObserver>,
}

impl Registration {
    fn wants(&self, changed: &ContentUri) -> bool {
        self.uri == *changed
            || changed.is_ancestor_of(&self.uri)
            || (self.descendants && self.uri.is_ancestor_of(changed))
    }
}

/// Explicit observer registry. Share it behind an `Arc`.
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: AtomicU64,
    observers: RwLock<Vec<Registration>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        uri: ContentUri,
        notify_for_descendants: bool,
        observer: Arc<dyn ChangeObserver>,
    ) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(?id, %uri, notify_for_descendants, "observer subscribed");
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration {
                id,
                uri,
                descendants: notify_for_descendants,
                observer,
            });
        id
    }

    /// Remove an observer; false if it was not registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|r| r.id != id);
        before != observers.len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Deliver a change event for `uri` to every interested observer.
    ///
    /// Failures (errors or panics) are logged and skipped; they never reach
    /// the caller and never stop delivery to the rest. Returns how many
    /// observers handled the event.
    pub fn notify(&self, uri: &ContentUri) -> usize {
        // snapshot so observers may (un)subscribe from inside on_change
        let targets: Vec<(ObserverId, Arc<dyn ChangeObserver>)> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.wants(uri))
            .map(|r| (r.id, Arc::clone(&r.observer)))
            .collect();

        let mut delivered = 0;
        for (id, observer) in targets {
            match panic::catch_unwind(AssertUnwindSafe(|| observer.on_change(uri))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => tracing::warn!(?id, %uri, error = %e, "observer failed"),
                Err(_) => tracing::warn!(?id, %uri, "observer panicked"),
            }
        }
        tracing::trace!(%uri, delivered, "change delivered");
        delivered
    }
}
