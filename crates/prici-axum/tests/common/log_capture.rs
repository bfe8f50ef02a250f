//! Tracing capture for asserting on diagnostic output

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Counts error-level events seen by the current thread's subscriber
#[derive(Clone, Default)]
pub struct ErrorEvents {
    count: Arc<AtomicUsize>,
}

impl ErrorEvents {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Install a thread-local subscriber that counts error events.
///
/// Use with a current-thread runtime so every poll happens under the guard.
pub fn capture_errors() -> (ErrorEvents, DefaultGuard) {
    let events = ErrorEvents::default();
    let subscriber = tracing_subscriber::registry().with(events.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (events, guard)
}
