use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::topics::topic_key;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerformanceTier {
    Excellent,
    VeryGood,
    Good,
    Fair,
    NeedsImprovement,
}

impl PerformanceTier {
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            90.. => Self::Excellent,
            80..=89 => Self::VeryGood,
            70..=79 => Self::Good,
            60..=69 => Self::Fair,
            _ => Self::NeedsImprovement,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }

    fn templates(self) -> &'static [&'static str] {
        match self {
            Self::Excellent => &[
                "Outstanding work! You scored {score}/{total} ({percentage}%) on the {topic} quiz. Your knowledge of {context} is exceptional and shows deep understanding. Keep up the excellent work!",
                "Fantastic performance! {percentage}% on {topic} demonstrates your mastery of {context}. You clearly have a strong foundation in this area. Continue exploring and learning!",
                "Brilliant results! Your {score}/{total} score in {topic} shows excellent comprehension of {context}. Your dedication to learning is truly impressive!",
            ],
            Self::VeryGood => &[
                "Great job! You scored {score}/{total} ({percentage}%) on the {topic} quiz. You have a solid understanding of {context} with just a few areas to explore further.",
                "Well done! Your {percentage}% performance in {topic} shows good knowledge of {context}. You're on the right track, so keep learning and growing!",
                "Excellent effort! {score}/{total} in {topic} demonstrates strong understanding of {context}. A few more study sessions and you'll master this topic!",
            ],
            Self::Good => &[
                "Good work! You scored {score}/{total} ({percentage}%) on the {topic} quiz. You have a decent grasp of {context}, but there's room for improvement.",
                "Not bad! Your {percentage}% in {topic} shows you understand the basics of {context}. Consider reviewing the questions you missed to strengthen your knowledge.",
                "Solid effort! {score}/{total} in {topic} indicates you're learning about {context}. Keep studying and you'll see great improvement!",
            ],
            Self::Fair => &[
                "Keep learning! You scored {score}/{total} ({percentage}%) on the {topic} quiz. You have some knowledge of {context}, but there are several areas to focus on.",
                "Room for improvement! Your {percentage}% in {topic} shows you're starting to understand {context}. Take time to review and study more.",
                "Don't give up! {score}/{total} in {topic} means you're building your knowledge of {context}. Every expert was once a beginner!",
            ],
            Self::NeedsImprovement => &[
                "Keep going! You scored {score}/{total} ({percentage}%) on the {topic} quiz. While this shows some knowledge gaps in {context}, it's a great starting point for learning.",
                "Learning opportunity! Your {percentage}% in {topic} points at areas to focus on in {context}. This is your chance to dive deeper and expand your understanding.",
                "Every journey begins with a step! {score}/{total} in {topic} shows you're beginning to explore {context}. Keep studying and you'll see amazing progress!",
            ],
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn topic_context(topic: &str) -> &'static str {
    match topic_key(topic).as_str() {
        "wellness" => "health and well-being",
        "tech-trends" => "technology and innovation",
        "history" => "historical knowledge",
        "science" => "scientific understanding",
        _ => "general knowledge",
    }
}

/// Local feedback: one of the tier's templates, filled in with the score.
pub fn templated_feedback<R: Rng + ?Sized>(
    score: usize,
    total: usize,
    percentage: u8,
    topic: &str,
    rng: &mut R,
) -> String {
    let tier = PerformanceTier::from_percentage(percentage);
    let template = tier
        .templates()
        .choose(rng)
        .copied()
        .unwrap_or("You scored {score}/{total} ({percentage}%) on the {topic} quiz.");

    template
        .replace("{score}", &score.to_string())
        .replace("{total}", &total.to_string())
        .replace("{percentage}", &percentage.to_string())
        .replace("{topic}", topic)
        .replace("{context}", topic_context(topic))
}
