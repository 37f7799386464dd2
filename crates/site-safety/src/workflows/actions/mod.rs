//! Corrective actions spawned by finalized inspections.

pub mod router;
pub mod service;


pub use router::action_router;
pub use service::{ActionDetail, ActionService, ActionServiceError, CloseAction, ReopenAction};
