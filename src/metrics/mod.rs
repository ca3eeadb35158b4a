pub mod aggregator;
pub mod emitter;
pub mod flusher;
pub mod system;

pub use aggregator::{AuthAttempts, MetricAggregator, PurchaseStats};
pub use emitter::MetricEmitter;
pub use flusher::{flush_once, spawn_flush_task};
