//! Tree Reconciler
//!
//! Brings the replica tree into agreement with the source tree, one stateless
//! cycle at a time, reporting each action as a structured event.

pub mod events;
pub mod reconciler;
pub mod report;

pub use events::{EventKind, EventSink, FanoutSink, MemorySink, SyncEvent, TracingSink};
pub use reconciler::Reconciler;
pub use report::CycleReport;
