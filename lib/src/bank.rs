use std::collections::{HashMap, HashSet};

use anyhow::{bail, Context, Result};
use log::warn;
use once_cell::sync::Lazy;
use rand::Rng;
use uuid::Uuid;

use crate::data::{assign_ids, questions_from_raw, Question, QuizData, QUESTIONS_PER_QUIZ};
use crate::raw_data::RawQuestionBank;
use crate::topics::topic_key;

/// Random draws tried per slot before a duplicate is accepted.
pub const MAX_DRAW_ATTEMPTS: usize = 20;

static BUNDLED_BANK: &str = include_str!("../data/question_bank.json");

static BUNDLED: Lazy<QuestionBank> = Lazy::new(|| {
    QuestionBank::from_slice(BUNDLED_BANK.as_bytes()).expect("bundled question bank is invalid")
});

/// Topic keyed pools of local questions used whenever remote generation is
/// unavailable. Every pool, the default one included, holds at least a full
/// quiz worth of questions.
#[derive(Clone, Debug)]
pub struct QuestionBank {
    default_topic: String,
    pools: HashMap<String, Vec<Question>>,
}

impl QuestionBank {
    pub fn bundled() -> &'static Self {
        &BUNDLED
    }

    pub fn from_slice(raw_data: &[u8]) -> Result<Self> {
        let raw: RawQuestionBank = serde_json::from_slice(raw_data)?;

        let mut pools = HashMap::new();
        for (topic, raw_questions) in raw.topics {
            let questions = questions_from_raw(raw_questions)
                .with_context(|| format!("invalid question in pool {topic:?}"))?;

            if questions.len() < QUESTIONS_PER_QUIZ {
                bail!(
                    "Pool {topic:?} has {} question(s), need at least {QUESTIONS_PER_QUIZ}",
                    questions.len()
                );
            }

            pools.insert(topic_key(&topic), questions);
        }

        let default_topic = topic_key(&raw.default_topic);
        if !pools.contains_key(&default_topic) {
            bail!("Default topic {:?} has no pool", raw.default_topic);
        }

        Ok(Self {
            default_topic,
            pools,
        })
    }

    pub fn default_topic(&self) -> &str {
        &self.default_topic
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    /// Pool for a topic, falling back to the default topic's pool for unknown
    /// keys.
    pub fn pool(&self, topic: &str) -> &[Question] {
        self.pools
            .get(&topic_key(topic))
            .or_else(|| self.pools.get(&self.default_topic))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Draws a full quiz from the topic's pool, avoiding repeated questions.
    pub fn draw<R: Rng + ?Sized>(&self, topic: &str, rng: &mut R) -> QuizData {
        let pool = self.pool(topic);

        let mut used = HashSet::new();
        let mut questions = Vec::with_capacity(QUESTIONS_PER_QUIZ);

        for _ in 0..QUESTIONS_PER_QUIZ {
            let mut attempts = 0;
            let question = loop {
                let candidate = &pool[rng.gen_range(0..pool.len())];
                attempts += 1;

                if used.insert(candidate.fingerprint()) {
                    break candidate;
                }

                if attempts >= MAX_DRAW_ATTEMPTS {
                    warn!("Accepting duplicate fallback question for {topic:?} after {attempts} draws");
                    break candidate;
                }
            };

            questions.push(Question {
                id: String::new(),
                ..question.clone()
            });
        }

        assign_ids(&mut questions);

        QuizData {
            id: Uuid::new_v4(),
            topic: topic.to_owned(),
            questions,
        }
    }
}
