mod epoch;
mod state;

pub use epoch::Epoch;
pub use state::{AutomationState, Snapshot, StateMachine, TransitionRecord};
