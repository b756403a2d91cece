//! Neurocura chat orchestration.
//!
//! [`ChatController`] applies user actions to sessions and turns gateway
//! replies into messages; [`RequestDispatcher`] runs the gateway calls on
//! background tasks.

pub mod controller;
pub mod dispatcher;
pub mod error;

pub use controller::{ApplyOutcome, ChatController, EditStatus};
pub use dispatcher::{Completion, RequestDispatcher, RequestKind, RequestTicket};
pub use error::{CoreError, CoreResult};
