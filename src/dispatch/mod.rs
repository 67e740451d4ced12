//! Outbound actions: two independently paced FIFO queues in front of the
//! transport.

mod queue;
mod transport;

pub use queue::{Delivery, DispatchQueue, QueueStats};
pub use transport::{QueueKind, Transport};

#[cfg(test)]
pub(crate) use transport::testing;
