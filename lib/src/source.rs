use std::future::Future;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use log::{error, info, warn};
use rand::rngs::StdRng;

use crate::bank::QuestionBank;
use crate::config::GeneratorConfig;
use crate::data::{QuizData, OPTIONS_PER_QUESTION, QUESTIONS_PER_QUIZ};
use crate::feedback::{templated_feedback, PerformanceTier};
use crate::remote::{strip_code_fence, ChatMessage, CompletionClient, CompletionRequest, GroqClient};
use crate::scoring::percentage;

/// Produces the questions for a new quiz.
pub trait QuestionSource {
    fn generate_questions(&self, topic: &str) -> impl Future<Output = Result<QuizData>>;
}

/// Produces the narrative shown next to a score.
pub trait FeedbackSource {
    fn generate_feedback(
        &self,
        score: usize,
        total: usize,
        topic: &str,
    ) -> impl Future<Output = Result<String>>;
}

impl<T: QuestionSource> QuestionSource for Arc<T> {
    fn generate_questions(&self, topic: &str) -> impl Future<Output = Result<QuizData>> {
        (**self).generate_questions(topic)
    }
}

impl<T: FeedbackSource> FeedbackSource for Arc<T> {
    fn generate_feedback(
        &self,
        score: usize,
        total: usize,
        topic: &str,
    ) -> impl Future<Output = Result<String>> {
        (**self).generate_feedback(score, total, topic)
    }
}

const QUESTION_SYSTEM_PROMPT: &str = "You are an expert quiz generator. Always return valid JSON with the exact structure requested. Never include any text outside the JSON object.";
const FEEDBACK_SYSTEM_PROMPT: &str = "You are a supportive educational coach. Provide encouraging and constructive feedback. Be motivational and specific. Keep it concise (2-3 sentences).";

fn question_request(topic: &str) -> CompletionRequest {
    let prompt = format!(
        r#"Generate {QUESTIONS_PER_QUIZ} unique, educational multiple choice questions about {topic}.

Requirements:
- Questions should be engaging and test real knowledge
- Each question should have exactly {OPTIONS_PER_QUESTION} options (A, B, C, D)
- Include a brief explanation for the correct answer
- Vary the difficulty level (mix of easy, medium, and challenging)
- Make questions current and relevant
- Ensure correctAnswer is the index (0-3) of the correct option

Return ONLY a valid JSON object with this exact structure:
{{
  "questions": [
    {{
      "id": "1",
      "question": "Your question here?",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctAnswer": 0,
      "explanation": "Brief explanation of why this is correct"
    }}
  ]
}}

Do not include any text outside the JSON object."#
    );

    CompletionRequest {
        messages: vec![
            ChatMessage::system(QUESTION_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ],
        temperature: 0.8,
        max_tokens: 2000,
        top_p: Some(0.9),
    }
}

fn feedback_request(score: usize, total: usize, percentage: u8, topic: &str) -> CompletionRequest {
    let tier = PerformanceTier::from_percentage(percentage);
    let prompt = format!(
        "Generate personalized, encouraging feedback for a quiz result.

Quiz Details:
- Topic: {topic}
- Score: {score}/{total} ({percentage}%)
- Performance Level: {tier}

Requirements:
- Be encouraging and motivational
- Acknowledge their specific performance level
- Provide constructive advice for improvement
- Keep it concise (2-3 sentences)
- Make it feel personal and supportive

Generate feedback that will motivate continued learning."
    );

    CompletionRequest {
        messages: vec![
            ChatMessage::system(FEEDBACK_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ],
        temperature: 0.9,
        max_tokens: 200,
        top_p: None,
    }
}

/// Question and feedback source backed by a remote completion client, with a
/// local fallback for every failure. Both source operations always succeed.
pub struct QuizService<C> {
    client: Option<C>,
    bank: &'static QuestionBank,
    rng: Mutex<StdRng>,
}

impl QuizService<GroqClient> {
    pub fn from_config(config: &GeneratorConfig, rng: StdRng) -> Result<Self> {
        let client = GroqClient::from_config(config)?;

        match &client {
            Some(client) => info!("Remote generation enabled with model {}", client.model()),
            None => warn!("No API key configured, serving fallback questions and feedback"),
        }

        Ok(Self::new(client, rng))
    }
}

impl<C: CompletionClient> QuizService<C> {
    pub fn new(client: Option<C>, rng: StdRng) -> Self {
        Self {
            client,
            bank: QuestionBank::bundled(),
            rng: Mutex::new(rng),
        }
    }

    pub fn fallback_only(rng: StdRng) -> Self {
        Self::new(None, rng)
    }

    pub fn is_remote(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self) -> Option<&C> {
        self.client.as_ref()
    }

    /// Five validated questions for the topic, from the remote generator when
    /// possible and from the local bank otherwise.
    pub async fn questions_for(&self, topic: &str) -> QuizData {
        if let Some(client) = &self.client {
            match Self::remote_questions(client, topic).await {
                Ok(quiz) => return quiz,
                Err(err) => error!("Failed to generate questions for {topic:?}: {err:#}"),
            }
        }

        self.fallback_questions(topic)
    }

    /// Feedback for a score, from the remote generator when possible and from
    /// the local templates otherwise.
    pub async fn feedback_for(&self, score: usize, total: usize, topic: &str) -> String {
        let percentage = percentage(score, total);

        if let Some(client) = &self.client {
            match Self::remote_feedback(client, score, total, percentage, topic).await {
                Ok(feedback) => return feedback,
                Err(err) => error!("Failed to generate feedback for {topic:?}: {err:#}"),
            }
        }

        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        templated_feedback(score, total, percentage, topic, &mut *rng)
    }

    async fn remote_questions(client: &C, topic: &str) -> Result<QuizData> {
        let content = client.complete(&question_request(topic)).await?;

        QuizData::from_slice(topic, strip_code_fence(&content).as_bytes())
    }

    async fn remote_feedback(
        client: &C,
        score: usize,
        total: usize,
        percentage: u8,
        topic: &str,
    ) -> Result<String> {
        let content = client
            .complete(&feedback_request(score, total, percentage, topic))
            .await?;

        if content.trim().is_empty() {
            bail!("empty feedback");
        }

        Ok(content.trim().to_owned())
    }

    fn fallback_questions(&self, topic: &str) -> QuizData {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        self.bank.draw(topic, &mut *rng)
    }
}

impl<C: CompletionClient> QuestionSource for QuizService<C> {
    async fn generate_questions(&self, topic: &str) -> Result<QuizData> {
        Ok(self.questions_for(topic).await)
    }
}

impl<C: CompletionClient> FeedbackSource for QuizService<C> {
    async fn generate_feedback(&self, score: usize, total: usize, topic: &str) -> Result<String> {
        Ok(self.feedback_for(score, total, topic).await)
    }
}
