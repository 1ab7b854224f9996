// src/tracker/mod.rs
//! Recording session state machine, fix filtering, and summary emission

pub mod recorder;
pub mod session;
pub mod summary;

pub use recorder::RouteRecorder;
pub use session::{FixOutcome, RecordingSession, RejectReason, SessionStatus};
pub use summary::{Difficulty, RouteSummary};
