//! In-process domain events for booking transitions.
//!
//! Handlers publish a [`BookingEvent`] after a transition commits; the
//! notification dispatcher consumes the bus and fans out to the durable
//! in-app channel and the best-effort messenger push. The bus is the seam
//! that keeps side-effect failures isolated from the transitions that caused
//! them.

pub mod bus;

pub use bus::{BookingEvent, EventBus, Recipient, RecordContext, SlotDeletedContext};
