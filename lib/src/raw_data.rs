use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Quiz payload as produced by the remote generator and stored in the bundled
/// question bank. Nothing here is validated yet.
#[derive(Serialize, Deserialize, Debug)]
pub struct RawQuizData {
    pub questions: Vec<RawQuestionData>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RawQuestionId>,

    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Question id as it appears on the wire. Generators emit strings or numbers;
/// anything else is kept only so the rest of the question still parses.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum RawQuestionId {
    Text(String),
    Number(serde_json::Number),
    Other(serde_json::Value),
}

impl RawQuestionId {
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(number) => Some(number.to_string()),
            Self::Other(_) => None,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawQuestionBank {
    pub default_topic: String,
    pub topics: HashMap<String, Vec<RawQuestionData>>,
}
