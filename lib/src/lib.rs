pub mod bank;
pub mod config;
pub mod data;
pub mod feedback;
pub mod raw_data;
pub mod remote;
pub mod scoring;
pub mod session;
pub mod source;
pub mod topics;

pub use bank::QuestionBank;
pub use config::GeneratorConfig;
pub use data::{Question, QuizData, Topic, OPTIONS_PER_QUESTION, QUESTIONS_PER_QUIZ};
pub use feedback::PerformanceTier;
pub use remote::{ChatMessage, CompletionClient, CompletionRequest, GroqClient};
pub use scoring::QuizResult;
pub use session::{Phase, QuizRequest, Session, SessionState, SubmitRequest};
pub use source::{FeedbackSource, QuestionSource, QuizService};
