mod answer;
mod bank;
mod exam;
mod ids;
mod question;
mod session;

pub use ids::{AttemptId, BankId, ParseIdError, QuestionId};

pub use answer::{Answer, AnswerLedger, Response};
pub use bank::{MalformedBankError, QuestionBank};
pub use exam::{
    ExamConfig, ExamConfigError, ExamKind, ExamTable, FreeFormPolicy, MOCK_SCALED_RULE,
    PassRule, PhraseBonus, RatingBasis, RatingTable, RatingTier, ReadinessBand, SentenceBonus,
    TimeoutPolicy, default_readiness,
};
pub use question::{
    AudioRef, DEFAULT_POINTS, Prompt, Question, QuestionKind, ResponseKind, WritingTask,
};
pub use session::{Rating, SessionOutcome, SessionSnapshot, SessionStatus, Verdict};
