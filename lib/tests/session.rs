use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use quizgen::topics::find_topic;
use quizgen::{
    CompletionClient, CompletionRequest, FeedbackSource, Phase, QuestionBank, QuestionSource,
    QuizData, QuizService, Session, SessionState, Topic, QUESTIONS_PER_QUIZ,
};

/// Completion client replaying canned replies, failing once they run out.
struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::default(),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("connection refused")))
    }
}

fn quiz_json(correct: &[i64]) -> String {
    let questions: Vec<_> = correct
        .iter()
        .enumerate()
        .map(|(i, correct)| {
            serde_json::json!({
                "id": format!("r{i}"),
                "question": format!("Remote question {i}?"),
                "options": ["w", "x", "y", "z"],
                "correctAnswer": correct,
                "explanation": "Because."
            })
        })
        .collect();

    serde_json::json!({ "questions": questions }).to_string()
}

fn service(replies: Vec<Result<String>>) -> Arc<QuizService<ScriptedClient>> {
    Arc::new(QuizService::new(
        Some(ScriptedClient::new(replies)),
        StdRng::seed_from_u64(42),
    ))
}

fn science() -> Topic {
    find_topic("science").cloned().unwrap()
}

/// Question source handing out one fixed quiz.
struct FixedQuiz(QuizData);

impl QuestionSource for FixedQuiz {
    async fn generate_questions(&self, _topic: &str) -> Result<QuizData> {
        Ok(self.0.clone())
    }
}

/// Feedback source failing a set number of times before succeeding.
struct FlakyFeedback {
    failures: Mutex<usize>,
}

impl FeedbackSource for FlakyFeedback {
    async fn generate_feedback(&self, score: usize, total: usize, topic: &str) -> Result<String> {
        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(anyhow!("service unavailable"));
        }

        Ok(format!("{score}/{total} on {topic}"))
    }
}

struct FailingQuestions;

impl QuestionSource for FailingQuestions {
    async fn generate_questions(&self, _topic: &str) -> Result<QuizData> {
        Err(anyhow!("network down"))
    }
}

fn fixed_session(failures: usize) -> Session<FixedQuiz, FlakyFeedback> {
    let quiz = QuizData::from_slice("Science", quiz_json(&[0, 1, 1, 3, 0]).as_bytes()).unwrap();

    Session::new(
        FixedQuiz(quiz),
        FlakyFeedback {
            failures: Mutex::new(failures),
        },
    )
}

#[tokio::test]
async fn remote_failure_still_reaches_the_quiz() {
    let service = service(vec![]);
    let mut session = Session::new(service.clone(), service.clone());

    session.select_topic(science());
    session.start_quiz().await;

    let state = session.state();
    assert_eq!(state.phase(), Phase::Quiz);
    assert!(!state.is_loading());
    assert!(state.error().is_none());
    assert_eq!(state.quiz().map(QuizData::len), Some(QUESTIONS_PER_QUIZ));
    assert_eq!(state.answers(), vec![None::<usize>; QUESTIONS_PER_QUIZ].as_slice());
}

#[tokio::test]
async fn short_remote_batch_is_replaced_by_the_fallback() {
    let service = service(vec![Ok(quiz_json(&[0, 1, 2, 3]))]);

    let quiz = service.questions_for("Science").await;

    assert_eq!(quiz.len(), QUESTIONS_PER_QUIZ);
    let pool = QuestionBank::bundled().pool("science");
    for question in &quiz.questions {
        assert!(!question.text.starts_with("Remote question"));
        assert!(pool.iter().any(|p| p.fingerprint() == question.fingerprint()));
    }
}

#[tokio::test]
async fn invalid_remote_question_discards_the_batch() {
    let service = service(vec![Ok(quiz_json(&[0, 1, 2, 3, 4]))]);

    let quiz = service.questions_for("History").await;

    assert_eq!(quiz.len(), QUESTIONS_PER_QUIZ);
    assert!(quiz.questions.iter().all(|q| !q.text.starts_with("Remote question")));
}

#[tokio::test]
async fn valid_remote_batch_is_used_as_is() {
    let service = service(vec![Ok(format!("```json\n{}\n```", quiz_json(&[3, 2, 1, 0, 0])))]);

    let quiz = service.questions_for("Tech Trends").await;

    assert_eq!(quiz.topic, "Tech Trends");
    assert_eq!(quiz.correct_answers(), vec![3, 2, 1, 0, 0]);
    assert_eq!(quiz.questions[0].id, "r0");
    assert_eq!(quiz.questions[4].explanation.as_deref(), Some("Because."));
}

#[tokio::test]
async fn fallback_only_service_never_calls_out() {
    let service = QuizService::<ScriptedClient>::fallback_only(StdRng::seed_from_u64(1));

    assert!(!service.is_remote());
    let quiz = service.questions_for("Underwater Basket Weaving").await;
    assert_eq!(quiz.len(), QUESTIONS_PER_QUIZ);
    assert!(!service.feedback_for(2, 5, "Science").await.is_empty());
}

#[tokio::test]
async fn feedback_falls_back_to_templates() {
    let service = service(vec![Ok("   ".into())]);

    let feedback = service.feedback_for(4, 5, "History").await;

    assert!(feedback.contains("History"));
    assert!(feedback.contains("historical knowledge"));
}

#[tokio::test]
async fn remote_feedback_request_carries_tier() {
    let service = service(vec![Ok("  Nice work!  ".into())]);

    let feedback = service.feedback_for(3, 5, "Science").await;

    assert_eq!(feedback, "Nice work!");
    let requests = service.client().unwrap().requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].messages[1].content;
    assert!(prompt.contains("Score: 3/5 (60%)"));
    assert!(prompt.contains("Performance Level: Fair"));
}

#[tokio::test]
async fn scoring_matches_the_recorded_answers() {
    let mut session = fixed_session(0);
    session.select_topic(science());
    session.start_quiz().await;

    for answer in [Some(0), Some(1), Some(2), Some(3), None] {
        if let Some(answer) = answer {
            session.answer_question(answer);
        }
        session.next_question();
    }
    session.submit_quiz().await;

    let state = session.state();
    assert_eq!(state.phase(), Phase::Results);
    let result = state.result().unwrap();
    assert_eq!(result.score, 3);
    assert_eq!(result.total, 5);
    assert_eq!(result.percentage, 60);
    assert_eq!(result.correct_answers, vec![0, 1, 1, 3, 0]);
    assert_eq!(result.user_answers, vec![Some(0), Some(1), Some(2), Some(3), None]);
    assert_eq!(result.feedback, "3/5 on Science");
}

#[tokio::test]
async fn navigation_clamps_at_both_ends() {
    let mut session = fixed_session(0);
    session.select_topic(science());
    session.start_quiz().await;

    for _ in 0..3 {
        session.previous_question();
        assert_eq!(session.state().current_index(), 0);
    }

    for _ in 0..10 {
        session.next_question();
    }
    assert_eq!(session.state().current_index(), QUESTIONS_PER_QUIZ - 1);
    assert!(session.state().is_last_question());

    session.next_question();
    assert_eq!(session.state().current_index(), QUESTIONS_PER_QUIZ - 1);
}

#[tokio::test]
async fn answers_round_trip_at_every_position() {
    let mut session = fixed_session(0);
    session.select_topic(science());
    session.start_quiz().await;

    for position in 0..QUESTIONS_PER_QUIZ {
        for option in 0..4 {
            session.answer_question(option);
            assert_eq!(session.state().current_answer(), Some(option));
        }
        assert_eq!(session.state().current_index(), position);
        session.next_question();
    }

    // Going back and answering again overwrites the slot.
    session.previous_question();
    session.answer_question(1);
    assert_eq!(session.state().current_answer(), Some(1));
    assert_eq!(session.state().answered_count(), QUESTIONS_PER_QUIZ);
}

#[tokio::test]
async fn out_of_range_options_are_ignored() {
    let mut session = fixed_session(0);
    session.select_topic(science());
    session.start_quiz().await;

    session.answer_question(2);
    session.answer_question(4);

    assert_eq!(session.state().current_answer(), Some(2));
}

#[tokio::test]
async fn reset_returns_to_the_initial_state() {
    let service = service(vec![]);
    let mut session = Session::new(service.clone(), service);

    session.select_topic(science());
    session.start_quiz().await;
    for _ in 0..QUESTIONS_PER_QUIZ {
        session.answer_question(0);
        session.next_question();
    }
    session.submit_quiz().await;
    assert_eq!(session.state().phase(), Phase::Results);
    assert!(!session.state().result().unwrap().feedback.is_empty());

    session.reset_quiz();

    let state = session.state();
    assert_eq!(state, &SessionState::default());
    assert!(state.selected_topic().is_none());
    assert!(state.quiz().is_none());
    assert_eq!(state.current_index(), 0);
    assert!(state.answers().is_empty());
    assert!(state.result().is_none());
    assert!(state.error().is_none());
    assert!(!state.is_loading());
}

#[tokio::test]
async fn failed_question_generation_keeps_the_phase() {
    let mut session = Session::new(
        FailingQuestions,
        FlakyFeedback {
            failures: Mutex::new(0),
        },
    );

    session.select_topic(science());
    session.start_quiz().await;

    let state = session.state();
    assert_eq!(state.phase(), Phase::TopicSelection);
    assert!(state.quiz().is_none());
    assert!(!state.is_loading());
    assert_eq!(
        state.error(),
        Some("Failed to generate quiz questions: network down")
    );

    session.set_error(None);
    assert!(session.state().error().is_none());
}

#[tokio::test]
async fn failed_feedback_allows_a_retry() {
    let mut session = fixed_session(1);
    session.select_topic(science());
    session.start_quiz().await;
    session.answer_question(0);

    session.submit_quiz().await;

    let state = session.state();
    assert_eq!(state.phase(), Phase::Quiz);
    assert!(state.result().is_none());
    assert!(!state.is_loading());
    assert_eq!(state.error(), Some("Failed to generate feedback: service unavailable"));
    assert_eq!(state.answers()[0], Some(0));

    session.submit_quiz().await;

    assert_eq!(session.state().phase(), Phase::Results);
    assert!(session.state().error().is_none());
    assert_eq!(session.state().result().unwrap().score, 1);
}

#[tokio::test]
async fn start_without_topic_is_ignored() {
    let service = service(vec![]);
    let mut session = Session::new(service.clone(), service.clone());

    session.start_quiz().await;
    session.submit_quiz().await;

    assert_eq!(session.state(), &SessionState::default());
    assert_eq!(service.client().unwrap().request_count(), 0);
}

#[tokio::test]
async fn stale_questions_after_reset_are_dropped() {
    let service = service(vec![]);
    let mut session = Session::new(service.clone(), service.clone());
    session.select_topic(science());

    let request = session.begin_start_quiz().unwrap();
    assert!(session.state().is_loading());

    let outcome = session.question_source().generate_questions(request.topic()).await;
    session.reset_quiz();

    assert!(!session.complete_start_quiz(request, outcome));
    assert_eq!(session.state(), &SessionState::default());
}

#[tokio::test]
async fn stale_feedback_after_reset_is_dropped() {
    let mut session = fixed_session(0);
    session.select_topic(science());
    session.start_quiz().await;

    session.answer_question(0);
    let request = session.begin_submit_quiz().unwrap();
    assert_eq!(request.score(), 1);
    assert_eq!(request.total(), QUESTIONS_PER_QUIZ);

    let outcome = session
        .feedback_source()
        .generate_feedback(request.score(), request.total(), request.topic())
        .await;
    assert_eq!(outcome.as_deref().unwrap(), "1/5 on Science");
    session.reset_quiz();

    assert!(!session.complete_submit_quiz(request, outcome));
    assert!(session.state().result().is_none());
    assert_eq!(session.state().phase(), Phase::TopicSelection);
}

#[tokio::test]
async fn reentrant_calls_while_loading_are_ignored() {
    let mut session = fixed_session(0);
    session.select_topic(science());

    let first = session.begin_start_quiz().unwrap();
    assert!(session.begin_start_quiz().is_none());
    assert!(session.begin_submit_quiz().is_none());

    let outcome = session.question_source().generate_questions(first.topic()).await;
    assert!(session.complete_start_quiz(first, outcome));
    assert_eq!(session.state().phase(), Phase::Quiz);

    let submission = session.begin_submit_quiz().unwrap();
    session.answer_question(3);
    assert!(session.begin_submit_quiz().is_none());
    assert!(session.begin_start_quiz().is_none());
    assert_eq!(session.state().current_answer(), None);

    assert!(session.complete_submit_quiz(submission, Ok("done".into())));
    assert_eq!(session.state().phase(), Phase::Results);
    assert!(!session.state().is_loading());
}

#[tokio::test]
async fn wrong_sized_quiz_from_a_custom_source_is_an_error() {
    let mut quiz = QuizData::from_slice("Science", quiz_json(&[0, 0, 0, 0, 0]).as_bytes()).unwrap();
    quiz.questions.pop();
    let mut session = Session::new(
        FixedQuiz(quiz),
        FlakyFeedback {
            failures: Mutex::new(0),
        },
    );

    session.select_topic(science());
    session.start_quiz().await;

    assert_eq!(session.state().phase(), Phase::TopicSelection);
    assert!(session.state().error().unwrap().starts_with("Failed to generate quiz questions"));
}
