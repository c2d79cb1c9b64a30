use std::collections::HashSet;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::raw_data::{RawQuestionData, RawQuestionId, RawQuizData};

pub const QUESTIONS_PER_QUIZ: usize = 5;
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub description: String,

    pub icon: String,
    pub color: String,
}

impl Topic {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            description: description.to_owned(),
            icon: String::new(),
            color: String::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub id: String,

    pub text: String,
    pub options: [String; OPTIONS_PER_QUESTION],
    pub correct_answer: usize,
    pub explanation: Option<String>,
}

impl Question {
    /// Content hash of the prompt and options. Ids are ignored so the same
    /// question renumbered in another batch still compares equal.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();

        hasher.update(self.text.trim().as_bytes());
        for option in &self.options {
            hasher.update(&[0]);
            hasher.update(option.trim().as_bytes());
        }

        hasher.finalize().to_string()
    }

    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct_answer)
    }

    fn from_raw(index: usize, raw: RawQuestionData) -> Result<Self> {
        if raw.question.trim().is_empty() {
            bail!("Question {index} has an empty prompt");
        }

        let option_count = raw.options.len();
        let options: [String; OPTIONS_PER_QUESTION] = match raw.options.try_into() {
            Ok(options) => options,
            Err(_) => bail!("Question {index} has {option_count} option(s)"),
        };

        if let Some(position) = options.iter().position(|option| option.trim().is_empty()) {
            bail!("Question {index} has an empty option at position {position}");
        }

        let correct_answer = match usize::try_from(raw.correct_answer) {
            Ok(answer) if answer < OPTIONS_PER_QUESTION => answer,
            _ => bail!(
                "Question {index} has correct answer {} out of range",
                raw.correct_answer
            ),
        };

        Ok(Self {
            id: raw
                .id
                .and_then(RawQuestionId::into_text)
                .unwrap_or_default()
                .trim()
                .to_owned(),
            text: raw.question,
            options,
            correct_answer,
            explanation: raw.explanation.filter(|text| !text.trim().is_empty()),
        })
    }
}

impl From<Question> for RawQuestionData {
    fn from(question: Question) -> Self {
        Self {
            id: Some(RawQuestionId::Text(question.id)),
            question: question.text,
            options: question.options.into(),
            correct_answer: question.correct_answer as i64,
            explanation: question.explanation,
        }
    }
}

/// Parses and checks a list of raw questions. A single bad question rejects
/// the whole list.
pub fn questions_from_raw(raw_questions: Vec<RawQuestionData>) -> Result<Vec<Question>> {
    raw_questions
        .into_iter()
        .enumerate()
        .map(|(index, raw)| Question::from_raw(index, raw))
        .collect()
}

/// Gives every question an id unique within the batch. Ids supplied with the
/// questions are kept only when all of them are present and distinct.
pub fn assign_ids(questions: &mut [Question]) {
    let mut seen = HashSet::new();
    let keep = questions
        .iter()
        .all(|question| !question.id.is_empty() && seen.insert(question.id.clone()));

    if keep {
        return;
    }

    for (index, question) in questions.iter_mut().enumerate() {
        question.id = (index + 1).to_string();
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct QuizData {
    pub id: Uuid,

    pub topic: String,
    pub questions: Vec<Question>,
}

impl QuizData {
    pub fn new(topic: &str, mut questions: Vec<Question>) -> Result<Self> {
        if questions.len() != QUESTIONS_PER_QUIZ {
            bail!(
                "Expected exactly {QUESTIONS_PER_QUIZ} questions, got {}",
                questions.len()
            );
        }

        assign_ids(&mut questions);

        Ok(Self {
            id: Uuid::new_v4(),
            topic: topic.to_owned(),
            questions,
        })
    }

    pub fn from_raw(topic: &str, raw: RawQuizData) -> Result<Self> {
        if raw.questions.len() != QUESTIONS_PER_QUIZ {
            bail!(
                "Expected exactly {QUESTIONS_PER_QUIZ} questions, got {}",
                raw.questions.len()
            );
        }

        Self::new(topic, questions_from_raw(raw.questions)?)
    }

    pub fn from_slice(topic: &str, raw_data: &[u8]) -> Result<Self> {
        let raw: RawQuizData = serde_json::from_slice(raw_data)?;

        Self::from_raw(topic, raw)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn correct_answers(&self) -> Vec<usize> {
        self.questions
            .iter()
            .map(|question| question.correct_answer)
            .collect()
    }
}
