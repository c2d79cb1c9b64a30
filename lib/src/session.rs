use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use serde::Serialize;

use crate::data::{Question, QuizData, Topic, QUESTIONS_PER_QUIZ};
use crate::scoring::{Grade, QuizResult};
use crate::source::{FeedbackSource, QuestionSource};

#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    TopicSelection,
    Quiz,
    Results,
}

/// Everything a front end needs to render a session. Only [`Session`]
/// mutates it.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    phase: Phase,
    selected_topic: Option<Topic>,
    quiz: Option<QuizData>,
    current_index: usize,
    answers: Vec<Option<usize>>,
    result: Option<QuizResult>,
    is_loading: bool,
    error: Option<String>,
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selected_topic(&self) -> Option<&Topic> {
        self.selected_topic.as_ref()
    }

    pub fn quiz(&self) -> Option<&QuizData> {
        self.quiz.as_ref()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.quiz
            .as_ref()
            .and_then(|quiz| quiz.questions.get(self.current_index))
    }

    pub fn current_answer(&self) -> Option<usize> {
        self.answers.get(self.current_index).copied().flatten()
    }

    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|answer| answer.is_some()).count()
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.question_count()
    }

    pub fn question_count(&self) -> usize {
        self.quiz.as_ref().map_or(0, QuizData::len)
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Pending question generation handed out by [`Session::begin_start_quiz`].
#[derive(Debug)]
pub struct QuizRequest {
    generation: u64,
    topic: String,
}

impl QuizRequest {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Pending submission handed out by [`Session::begin_submit_quiz`]. The grade
/// is fixed when the submission starts.
#[derive(Debug)]
pub struct SubmitRequest {
    generation: u64,
    topic: String,
    grade: Grade,
}

impl SubmitRequest {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn score(&self) -> usize {
        self.grade.score
    }

    pub fn total(&self) -> usize {
        self.grade.total
    }
}

/// Quiz lifecycle for a single user.
///
/// The two operations that talk to a collaborator come in two halves:
/// `begin_*` updates the state synchronously and returns a request, and
/// `complete_*` applies the collaborator's outcome. Every `begin_*` and every
/// reset moves the session to a new generation, and an outcome for an older
/// generation is dropped. [`Session::start_quiz`] and
/// [`Session::submit_quiz`] run both halves around the collaborator call.
///
/// No operation fails: calls whose preconditions do not hold are ignored and
/// navigation clamps to the quiz bounds.
pub struct Session<Q, F> {
    questions: Q,
    feedback: F,
    state: SessionState,
    generation: u64,
}

impl<Q: QuestionSource, F: FeedbackSource> Session<Q, F> {
    pub fn new(questions: Q, feedback: F) -> Self {
        Self {
            questions,
            feedback,
            state: SessionState::default(),
            generation: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn question_source(&self) -> &Q {
        &self.questions
    }

    pub fn feedback_source(&self) -> &F {
        &self.feedback
    }

    pub fn select_topic(&mut self, topic: Topic) {
        debug!("Selected topic {:?}", topic.id);

        self.state.selected_topic = Some(topic);
        self.state.error = None;
    }

    pub async fn start_quiz(&mut self) {
        let Some(request) = self.begin_start_quiz() else {
            return;
        };

        let outcome = self.questions.generate_questions(&request.topic).await;
        self.complete_start_quiz(request, outcome);
    }

    /// Returns `None` without touching the state when no topic is selected or
    /// a collaborator call is already in flight.
    pub fn begin_start_quiz(&mut self) -> Option<QuizRequest> {
        if self.state.is_loading {
            warn!("Ignoring quiz start while another request is in flight");
            return None;
        }

        let topic = self.state.selected_topic.as_ref()?.name.clone();

        self.state.is_loading = true;
        self.state.error = None;
        self.generation += 1;

        Some(QuizRequest {
            generation: self.generation,
            topic,
        })
    }

    /// Returns whether the outcome was applied.
    pub fn complete_start_quiz(&mut self, request: QuizRequest, outcome: Result<QuizData>) -> bool {
        if request.generation != self.generation {
            debug!("Dropping questions for stale request on {:?}", request.topic);
            return false;
        }

        let outcome = outcome.and_then(|quiz| {
            if quiz.len() == QUESTIONS_PER_QUIZ {
                Ok(quiz)
            } else {
                Err(anyhow!(
                    "expected {QUESTIONS_PER_QUIZ} questions, got {}",
                    quiz.len()
                ))
            }
        });

        match outcome {
            Ok(quiz) => {
                info!("Started quiz {} on {:?}", quiz.id, quiz.topic);

                self.state.answers = vec![None; quiz.len()];
                self.state.quiz = Some(quiz);
                self.state.current_index = 0;
                self.state.result = None;
                self.state.phase = Phase::Quiz;
                self.state.error = None;
            }
            Err(err) => {
                self.state.error = Some(format!("Failed to generate quiz questions: {err}"));
            }
        }

        self.state.is_loading = false;
        true
    }

    /// Records `option` for the current question, replacing any earlier
    /// answer. Ignored outside an active quiz, while loading, or for an option
    /// the question does not have.
    pub fn answer_question(&mut self, option: usize) {
        if self.state.phase != Phase::Quiz || self.state.is_loading {
            return;
        }

        let Some(question) = self.state.current_question() else {
            return;
        };
        if option >= question.options.len() {
            return;
        }

        if let Some(slot) = self.state.answers.get_mut(self.state.current_index) {
            *slot = Some(option);
        }
    }

    pub fn next_question(&mut self) {
        let last = self.state.question_count().saturating_sub(1);

        self.state.current_index = (self.state.current_index + 1).min(last);
    }

    pub fn previous_question(&mut self) {
        self.state.current_index = self.state.current_index.saturating_sub(1);
    }

    pub async fn submit_quiz(&mut self) {
        let Some(request) = self.begin_submit_quiz() else {
            return;
        };

        let outcome = self
            .feedback
            .generate_feedback(request.grade.score, request.grade.total, &request.topic)
            .await;
        self.complete_submit_quiz(request, outcome);
    }

    /// Grades the recorded answers. Returns `None` without touching the state
    /// when there is no quiz or topic, or a collaborator call is in flight.
    pub fn begin_submit_quiz(&mut self) -> Option<SubmitRequest> {
        if self.state.is_loading {
            warn!("Ignoring submission while another request is in flight");
            return None;
        }

        let topic = self.state.selected_topic.as_ref()?.name.clone();
        let quiz = self.state.quiz.as_ref()?;
        let grade = Grade::new(&quiz.questions, &self.state.answers);

        self.state.is_loading = true;
        self.state.error = None;
        self.generation += 1;

        Some(SubmitRequest {
            generation: self.generation,
            topic,
            grade,
        })
    }

    /// Returns whether the outcome was applied.
    pub fn complete_submit_quiz(&mut self, request: SubmitRequest, outcome: Result<String>) -> bool {
        if request.generation != self.generation {
            debug!("Dropping feedback for stale submission on {:?}", request.topic);
            return false;
        }

        let outcome = outcome.and_then(|feedback| {
            if feedback.trim().is_empty() {
                Err(anyhow!("empty feedback"))
            } else {
                Ok(feedback)
            }
        });

        match outcome {
            Ok(feedback) => {
                let result = request.grade.into_result(feedback);
                info!(
                    "Submitted quiz on {:?}: {}/{} ({}%)",
                    request.topic, result.score, result.total, result.percentage
                );

                self.state.result = Some(result);
                self.state.phase = Phase::Results;
                self.state.error = None;
            }
            Err(err) => {
                self.state.error = Some(format!("Failed to generate feedback: {err}"));
            }
        }

        self.state.is_loading = false;
        true
    }

    pub fn reset_quiz(&mut self) {
        self.state = SessionState::default();
        self.generation += 1;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.state.error = error;
    }
}
