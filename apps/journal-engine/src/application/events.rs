//! Engine Event Bus
//!
//! Fan-out of local mutation notifications using a tokio broadcast channel.
//! The bus is owned by the engine container and handed to every store that
//! mutates journal state; the backup coordinator is its main subscriber.

use tokio::sync::broadcast;

use crate::domain::shared::TradeId;

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A local journal mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEvent {
    /// An annotation record was created or updated.
    AnnotationChanged {
        /// The annotated trade.
        trade_id: TradeId,
    },
    /// Annotation records were overlaid from an imported bundle.
    AnnotationsImported {
        /// Number of records written.
        count: usize,
    },
    /// The strategy list changed.
    StrategiesChanged,
    /// The watchlist changed.
    WatchlistChanged,
    /// UI preferences changed.
    UiPrefsChanged,
    /// Journal column configuration changed.
    JournalConfigChanged,
    /// The settings map changed.
    SettingsChanged,
}

/// Instance-scoped change notification channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JournalEvent>,
}

impl EventBus {
    /// Create a bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            tx: broadcast::channel(capacity.max(1)).0,
        }
    }

    /// Publish an event.
    ///
    /// Returns the number of receivers reached, or `None` when nobody is
    /// listening.
    pub fn publish(&self, event: JournalEvent) -> Option<usize> {
        tracing::trace!(?event, "Journal event");
        self.tx.send(event).ok()
    }

    /// Get a new receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<JournalEvent> {
        self.tx.subscribe()
    }

    /// Number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(JournalEvent::WatchlistChanged), None);
    }

    #[tokio::test]
    async fn subscribers_receive_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);

        bus.publish(JournalEvent::AnnotationChanged {
            trade_id: TradeId::new("7"),
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            JournalEvent::AnnotationChanged {
                trade_id: TradeId::new("7")
            }
        );
    }
}
