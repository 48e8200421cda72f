use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::config::Config;
use crate::models::event::BookingEvent;
use crate::notify::{LogNotifier, Notifier};
use crate::observability::metrics::Metrics;
use crate::store::Store;

pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub notifier: Arc<dyn Notifier>,
    pub assignment_tx: mpsc::Sender<Uuid>,
    pub booking_events_tx: broadcast::Sender<BookingEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Config, notifier: Arc<dyn Notifier>) -> (Self, mpsc::Receiver<Uuid>) {
        let (assignment_tx, assignment_rx) = mpsc::channel(config.assignment_queue_size);
        let (booking_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        (
            Self {
                config,
                store: Store::new(),
                notifier,
                assignment_tx,
                booking_events_tx,
                metrics: Metrics::new(),
            },
            assignment_rx,
        )
    }

    /// State with default configuration and log-only notifications.
    pub fn with_defaults() -> (Self, mpsc::Receiver<Uuid>) {
        Self::new(Config::default(), Arc::new(LogNotifier))
    }
}
