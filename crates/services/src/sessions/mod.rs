mod countdown;
mod driver;
mod mock_exam;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{SessionCommand, SessionError};
pub use countdown::{
    ClockSource, CountdownExit, CountdownHandle, IntervalClock, ManualClock, ManualTicker,
    SharedSession, spawn_countdown,
};
pub use driver::SessionDriver;
pub use mock_exam::{MockExam, MockExamReport, SectionReport};
pub use progress::SessionProgress;
pub use service::ExamSession;
pub use workflow::SessionLoopService;
