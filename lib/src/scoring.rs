use serde::{Deserialize, Serialize};

use crate::data::Question;
use crate::feedback::PerformanceTier;

/// `round(100 * score / total)` with halves rounded up, in integer math.
pub fn percentage(score: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }

    let score = score.min(total);
    ((200 * score + total) / (2 * total)) as u8
}

/// Number of recorded answers matching the question's correct option.
pub fn score(questions: &[Question], answers: &[Option<usize>]) -> usize {
    questions
        .iter()
        .zip(answers.iter().copied().chain(std::iter::repeat(None)))
        .filter(|(question, answer)| question.is_correct(*answer))
        .count()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct QuizResult {
    pub score: usize,
    pub total: usize,
    pub percentage: u8,
    pub feedback: String,

    pub correct_answers: Vec<usize>,
    pub user_answers: Vec<Option<usize>>,
}

impl QuizResult {
    pub fn tier(&self) -> PerformanceTier {
        PerformanceTier::from_percentage(self.percentage)
    }

    pub fn is_correct(&self, index: usize) -> bool {
        match (self.correct_answers.get(index), self.user_answers.get(index)) {
            (Some(correct), Some(Some(answer))) => correct == answer,
            _ => false,
        }
    }
}

/// Grade taken when a submission starts; the feedback is fetched for it and
/// attached afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grade {
    pub score: usize,
    pub total: usize,
    pub percentage: u8,

    pub correct_answers: Vec<usize>,
    pub user_answers: Vec<Option<usize>>,
}

impl Grade {
    pub fn new(questions: &[Question], answers: &[Option<usize>]) -> Self {
        let total = questions.len();
        let score = score(questions, answers);

        let mut user_answers = answers.to_vec();
        user_answers.resize(total, None);

        Self {
            score,
            total,
            percentage: percentage(score, total),
            correct_answers: questions
                .iter()
                .map(|question| question.correct_answer)
                .collect(),
            user_answers,
        }
    }

    pub fn into_result(self, feedback: String) -> QuizResult {
        QuizResult {
            score: self.score,
            total: self.total,
            percentage: self.percentage,
            feedback,
            correct_answers: self.correct_answers,
            user_answers: self.user_answers,
        }
    }
}
