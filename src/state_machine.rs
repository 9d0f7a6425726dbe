//! Tool-call resolution state machine
//!
//! Pure transitions in the Elm Architecture style: the transition function
//! returns the next state plus the effects the runtime must perform, and the
//! runtime feeds the outcome of those effects back as events.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{Event, ToolResult};
pub use state::{
    LoopContext, LoopState, StopCondition, TerminationReason, DEFAULT_MAX_ITERATIONS,
};
pub use transition::{transition, TransitionError};
