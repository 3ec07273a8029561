mod controller;
mod progress;
mod session;

// Public API of the exam subsystem.
pub use crate::error::ExamError;
pub use controller::ExamController;
pub use progress::ExamProgress;
pub use session::ExamSession;
