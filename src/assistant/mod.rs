//! Question answering: emergency triggers, retrieval-grounded prompting and
//! the offline fallbacks.

pub mod emergency;
pub mod fallback;
pub mod prompt;
pub mod responder;

pub use emergency::EmergencyDetector;
pub use responder::{Responder, DISCLAIMER};
