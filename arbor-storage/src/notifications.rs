//! Cancelable pre-operation notifications.
//!
//! Services raise a [`ContentEvent`] before every irreversible step. All
//! subscribed observers are asked in registration order and every verdict
//! is collected; the operation proceeds only if none of them denies.
//! Observers run synchronously on the caller's thread with no timeout.

use arbor_types::{ContentEvent, Verdict};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Receives pre-operation events and may veto them.
pub trait ContentObserver: Send + Sync {
    fn on_event(&self, event: &ContentEvent) -> Verdict;
}

impl<F> ContentObserver for F
where
    F: Fn(&ContentEvent) -> Verdict + Send + Sync,
{
    fn on_event(&self, event: &ContentEvent) -> Verdict {
        self(event)
    }
}

/// Fan-out of content events to registered observers.
#[derive(Default)]
pub struct NotificationBus {
    observers: RwLock<Vec<Arc<dyn ContentObserver>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn ContentObserver>) {
        match self.observers.write() {
            Ok(mut observers) => observers.push(observer),
            Err(poisoned) => poisoned.into_inner().push(observer),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.snapshot().len()
    }

    /// Raises `event` and returns the combined verdict.
    ///
    /// Every observer is consulted even after a denial. The first denial's
    /// reason is returned.
    pub fn raise(&self, event: &ContentEvent) -> Verdict {
        let verdicts: Vec<Verdict> = self
            .snapshot()
            .iter()
            .map(|observer| observer.on_event(event))
            .collect();

        match verdicts.into_iter().find(|v| !v.is_allowed()) {
            Some(Verdict::Deny { reason }) => {
                warn!(
                    "{} of node {} cancelled by observer: {}",
                    event.operation.name(),
                    event.node_id,
                    reason
                );
                Verdict::Deny { reason }
            }
            _ => {
                debug!("{} of node {} allowed", event.operation.name(), event.node_id);
                Verdict::Allow
            }
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn ContentObserver>> {
        match self.observers.read() {
            Ok(observers) => observers.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
