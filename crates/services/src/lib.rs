#![forbid(unsafe_code)]

pub mod error;
pub mod gate;
pub mod observer;
pub mod sessions;

pub use exam_core::Clock;

pub use error::{SessionCommand, SessionError};
pub use gate::{AudioGate, PlaybackLog};
pub use observer::{SessionObserver, SnapshotRecorder, TracingObserver};

pub use sessions::{
    ClockSource, CountdownExit, CountdownHandle, ExamSession, IntervalClock, ManualClock,
    ManualTicker, MockExam, MockExamReport, SectionReport, SessionDriver, SessionLoopService,
    SessionProgress, SharedSession, spawn_countdown,
};
