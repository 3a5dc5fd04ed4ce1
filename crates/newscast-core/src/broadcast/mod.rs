//! Broadcast fan-out engine.
//!
//! A [`Broadcaster`] takes a registry snapshot, drops excluded chats, hands each
//! remaining chat to the delivery unit and aggregates the outcomes, reporting
//! progress every `cadence` completed deliveries.

pub mod coordinator;
pub mod delivery;
pub mod outcome;
pub mod payload;
pub mod progress;

pub use coordinator::{BroadcastOptions, Broadcaster, Coordinator};
pub use delivery::deliver;
pub use outcome::{BroadcastResult, BroadcastSummary, DeliveryOutcome, DeliveryStatus, RunStatus};
pub use payload::{ContentPayload, Media, MediaKind, Payload, PollPayload};
pub use progress::{Cadence, NoopReporter, ProgressPhase, ProgressReporter, ProgressSnapshot};
