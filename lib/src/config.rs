use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Value shipped in the sample `.env`; treated the same as a missing key.
pub const PLACEHOLDER_API_KEY: &str = "your_groq_api_key_here";

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub api_key: Option<SecretString>,
    pub model: String,
    pub api_url: Url,
    pub timeout: Duration,
}

impl GeneratorConfig {
    /// The API key, unless it is missing, blank or the placeholder.
    pub fn credential(&self) -> Option<&SecretString> {
        self.api_key.as_ref().filter(|key| {
            let key = key.expose_secret().trim();
            !key.is_empty() && key != PLACEHOLDER_API_KEY
        })
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
