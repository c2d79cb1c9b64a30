use once_cell::sync::Lazy;

use crate::data::Topic;

static CATALOG: Lazy<Vec<Topic>> = Lazy::new(|| {
    vec![
        Topic {
            icon: "💪".into(),
            color: "green".into(),
            ..Topic::new(
                "wellness",
                "Wellness",
                "Health, nutrition, fitness, and mental well-being",
            )
        },
        Topic {
            icon: "🤖".into(),
            color: "blue".into(),
            ..Topic::new(
                "tech-trends",
                "Tech Trends",
                "Artificial Intelligence, blockchain, and emerging technologies",
            )
        },
        Topic {
            icon: "📚".into(),
            color: "purple".into(),
            ..Topic::new(
                "history",
                "History",
                "World history, historical events, and famous figures",
            )
        },
        Topic {
            icon: "🔬".into(),
            color: "orange".into(),
            ..Topic::new(
                "science",
                "Science",
                "Physics, chemistry, biology, and scientific discoveries",
            )
        },
    ]
});

pub fn catalog() -> &'static [Topic] {
    &CATALOG
}

/// Looks a topic up by id or display name, ignoring case.
pub fn find_topic(key: &str) -> Option<&'static Topic> {
    let key = key.trim();

    catalog()
        .iter()
        .find(|topic| topic.id.eq_ignore_ascii_case(key) || topic.name.eq_ignore_ascii_case(key))
}

/// Normalizes a topic id or display name into a bank key: "Tech Trends" and
/// "tech_trends" both become "tech-trends".
pub fn topic_key(topic: &str) -> String {
    topic
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
