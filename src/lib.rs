//! ANGLER: automation kernel for a single remote game session.
//!
//! The kernel tracks an epoch that moves on every state transition, paces
//! outbound commands and chat through two FIFO queues, lets workflow code
//! wait for the first of several inbound events (cancellable by epoch), and
//! decodes the periodic visual challenge.

pub mod captcha;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod session;
pub mod signals;
pub mod state_machine;

mod sync;

pub use config::AnglerConfig;
pub use error::{AnglerError, TransportError};
pub use session::{Session, SessionBuilder};
