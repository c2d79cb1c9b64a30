use anyhow::Result;
use quizgen::topics::{catalog, find_topic, topic_key};
use quizgen::{FeedbackSource, Phase, QuestionSource, Session, SessionState, Topic};
use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};

const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

const HELP: &str = "Answer with a-d or 1-4, n/p to move, s to submit, q to quit";

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Answer(usize),
    Next,
    Previous,
    Submit,
    Quit,
    Help,
}

fn parse_action(line: &str) -> Option<Action> {
    let line = line.trim().to_lowercase();

    let action = match line.as_str() {
        "n" | "next" => Action::Next,
        "p" | "prev" | "previous" => Action::Previous,
        "s" | "submit" => Action::Submit,
        "q" | "quit" | "exit" => Action::Quit,
        "h" | "help" | "?" => Action::Help,
        "a" | "1" => Action::Answer(0),
        "b" | "2" => Action::Answer(1),
        "c" | "3" => Action::Answer(2),
        "d" | "4" => Action::Answer(3),
        _ => return None,
    };

    Some(action)
}

/// Catalog topic for a key, or an ad hoc topic named after it.
fn resolve_topic(key: &str) -> Topic {
    match find_topic(key) {
        Some(topic) => topic.clone(),
        None => Topic::new(&topic_key(key), key.trim(), ""),
    }
}

pub fn print_topics() {
    for topic in catalog() {
        println!("{:<12} {} {:<12} {}", topic.id, topic.icon, topic.name, topic.description);
    }
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<String>> {
    Ok(lines.next_line().await?)
}

async fn choose_topic(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<Topic>> {
    for (index, topic) in catalog().iter().enumerate() {
        println!("{}. {} {}", index + 1, topic.icon, topic.name);
    }
    println!("Pick a topic by number or name:");

    while let Some(line) = prompt(lines).await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let topic = match line.parse::<usize>() {
            Ok(number) if (1..=catalog().len()).contains(&number) => catalog()[number - 1].clone(),
            _ => resolve_topic(line),
        };
        return Ok(Some(topic));
    }

    Ok(None)
}

fn print_question(state: &SessionState) {
    let (Some(quiz), Some(question)) = (state.quiz(), state.current_question()) else {
        return;
    };

    println!();
    println!(
        "Question {}/{} [{}] ({} answered)",
        state.current_index() + 1,
        quiz.len(),
        quiz.topic,
        state.answered_count()
    );
    println!("{}", question.text);

    for (index, option) in question.options.iter().enumerate() {
        let marker = if state.current_answer() == Some(index) { '*' } else { ' ' };
        println!(" {marker} {}) {option}", OPTION_LABELS[index]);
    }
}

fn print_result(state: &SessionState) {
    let (Some(quiz), Some(result)) = (state.quiz(), state.result()) else {
        return;
    };

    println!();
    println!(
        "Score: {}/{} ({}%) - {}",
        result.score,
        result.total,
        result.percentage,
        result.tier()
    );
    println!("{}", result.feedback);
    println!();

    for (index, question) in quiz.questions.iter().enumerate() {
        let mark = if result.is_correct(index) { "✓" } else { "✗" };
        let answer = result.user_answers[index]
            .and_then(|answer| question.options.get(answer))
            .map_or("(no answer)", String::as_str);

        println!("{mark} {}. {}", index + 1, question.text);
        println!("    your answer: {answer}");
        if !result.is_correct(index) {
            println!("    correct: {}", question.options[question.correct_answer]);
        }
        if let Some(explanation) = &question.explanation {
            println!("    {explanation}");
        }
    }
}

pub async fn play<Q, F>(mut session: Session<Q, F>, topic: Option<String>) -> Result<()>
where
    Q: QuestionSource,
    F: FeedbackSource,
{
    let mut lines = BufReader::new(io::stdin()).lines();

    let topic = match topic {
        Some(key) => resolve_topic(&key),
        None => match choose_topic(&mut lines).await? {
            Some(topic) => topic,
            None => return Ok(()),
        },
    };

    session.select_topic(topic);
    println!("Preparing your quiz...");
    session.start_quiz().await;

    if let Some(error) = session.state().error() {
        eprintln!("{error}");
        return Ok(());
    }

    println!("{HELP}");
    print_question(session.state());

    while session.state().phase() == Phase::Quiz {
        let Some(line) = prompt(&mut lines).await? else {
            return Ok(());
        };

        match parse_action(&line) {
            Some(Action::Answer(option)) => {
                session.answer_question(option);
                session.next_question();
            }
            Some(Action::Next) => session.next_question(),
            Some(Action::Previous) => session.previous_question(),
            Some(Action::Submit) => {
                println!("Scoring...");
                session.submit_quiz().await;

                if let Some(error) = session.state().error().map(str::to_owned) {
                    eprintln!("{error}, submit again to retry");
                    session.set_error(None);
                }
            }
            Some(Action::Quit) => return Ok(()),
            Some(Action::Help) | None => println!("{HELP}"),
        }

        if session.state().phase() == Phase::Quiz {
            print_question(session.state());
        }
    }

    print_result(session.state());
    session.reset_quiz();

    Ok(())
}
