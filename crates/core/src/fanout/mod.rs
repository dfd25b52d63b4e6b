//! Real-time fan-out hub.
//!
//! A bounded registry of live subscribers fed by a single outbound channel:
//!
//! ```text
//!  producer (interval) ─┐
//!  other enqueuers ─────┼─> mpsc ─> consumer ─> write to every subscriber
//!                       ┘                       (per-write deadline)
//! ```
//!
//! Subscriber lifecycle: `Connecting` (holding an [`AdmissionTicket`]) ->
//! `Active` (registered, initial snapshot delivered) -> `Closing` -> removed.
//! Removal is idempotent and never happens mid-broadcast.

mod hub;
mod message;
mod session;
mod sink;


pub use hub::{
    AdmissionRejected, AdmissionTicket, DeliveryReport, FanoutHub, HubConfig, HubError, HubHandle,
    SubscriberId,
};
pub use message::{Frame, HubMessage, SnapshotPayload};
pub use session::SessionEnd;
pub use sink::{Inbound, SinkError, SnapshotSource, SubscriberSink};
