use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use quizgen::config::{DEFAULT_API_URL, DEFAULT_MODEL};
use quizgen::{GeneratorConfig, QuizService, Session};
use rand::rngs::StdRng;
use rand::SeedableRng;
use secrecy::SecretString;
use url::Url;

mod generate;
mod play;

#[derive(Parser)]
#[clap(version, about = "Five question topic quizzes, generated remotely or from a local bank")]
struct Quizgen {
    #[clap(flatten)]
    generator: GeneratorArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GeneratorArgs {
    /// Chat completion API key. Without one only local questions are used.
    #[clap(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[clap(long, env = "GROQ_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    #[clap(long, env = "GROQ_API_URL", value_parser, default_value = DEFAULT_API_URL)]
    api_url: Url,

    /// Request timeout in seconds.
    #[clap(long, env = "GROQ_TIMEOUT_SECS", value_parser, default_value_t = 30)]
    timeout: u64,

    /// Seed for the local question and feedback selection.
    #[clap(long, value_parser)]
    seed: Option<u64>,
}

impl GeneratorArgs {
    fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            api_key: self.api_key.clone().map(SecretString::new),
            model: self.model.clone(),
            api_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List the topic catalog.
    Topics,
    /// Print a generated quiz as JSON.
    Generate {
        #[clap(short, long, value_parser)]
        topic: String,
    },
    /// Print the feedback for a score.
    Feedback {
        #[clap(short, long, value_parser)]
        topic: String,
        #[clap(short, long, value_parser)]
        score: usize,
        #[clap(long, value_parser, default_value_t = quizgen::QUESTIONS_PER_QUIZ)]
        total: usize,
    },
    /// Take a quiz in the terminal.
    Play {
        #[clap(short, long, value_parser)]
        topic: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(feature = "env-file")]
    dotenvy::dotenv().ok();

    pretty_env_logger::init();

    let quizgen = Quizgen::parse();
    let service = Arc::new(QuizService::from_config(
        &quizgen.generator.config(),
        quizgen.generator.rng(),
    )?);

    match quizgen.command {
        Command::Topics => play::print_topics(),
        Command::Generate { topic } => generate::generate(&*service, &topic).await?,
        Command::Feedback {
            topic,
            score,
            total,
        } => generate::feedback(&*service, score, total, &topic).await?,
        Command::Play { topic } => {
            play::play(Session::new(service.clone(), service), topic).await?
        }
    }

    Ok(())
}
