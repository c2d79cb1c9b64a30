use anyhow::{bail, Result};
use quizgen::raw_data::{RawQuestionData, RawQuizData};
use quizgen::{CompletionClient, QuizService};

/// Prints a quiz in the question bank's JSON layout, so generated questions
/// can be pasted into a pool.
pub async fn generate<C: CompletionClient>(service: &QuizService<C>, topic: &str) -> Result<()> {
    let quiz = service.questions_for(topic).await;

    let raw_quiz = RawQuizData {
        questions: quiz
            .questions
            .into_iter()
            .map(Into::into)
            .collect::<Vec<RawQuestionData>>(),
    };
    println!("{}", serde_json::to_string_pretty(&raw_quiz)?);

    Ok(())
}

pub async fn feedback<C: CompletionClient>(
    service: &QuizService<C>,
    score: usize,
    total: usize,
    topic: &str,
) -> Result<()> {
    if total == 0 || score > total {
        bail!("Score {score} out of {total} is not a valid result");
    }

    println!("{}", service.feedback_for(score, total, topic).await);

    Ok(())
}
