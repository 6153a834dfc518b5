use anyhow::{bail, Context};
use quiz_engine::{
    config::{get_config, init_config},
    dto::authoring_dto::QuizBundle,
    error::Error,
    models::{
        question::OptionLetter,
        quiz::{QuizCategory, QuizFilter},
    },
    services::{
        attempt_service::{RunOutcome, SessionObserver},
        attempt_session::{AttemptSession, AttemptState, SessionEvent},
    },
    utils::time::format_clock,
    AppState,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: quiz-engine list [search...] [--category NAME] | quiz-engine history \
                     | quiz-engine attempt <quiz_id> | quiz-engine publish <bundle.json>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let config = get_config()?;
    let state = AppState::new(config)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [command, quiz_id] if command == "attempt" => {
            let quiz_id: i64 = quiz_id.parse().context("quiz id must be a number")?;
            attempt(&state, quiz_id, config.user_id).await
        }
        [command, path] if command == "publish" => publish(&state, path).await,
        [command, rest @ ..] if command == "list" => list(&state, parse_filter(rest)?).await,
        [command] if command == "history" => history(&state).await,
        _ => bail!(USAGE),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn parse_filter(args: &[String]) -> anyhow::Result<QuizFilter> {
    let mut words = Vec::new();
    let mut category = None;
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        if arg == "--category" {
            let Some(name) = args.next() else {
                bail!("--category needs a name");
            };
            category = Some(name.parse::<QuizCategory>().map_err(anyhow::Error::msg)?);
        } else {
            words.push(arg.as_str());
        }
    }
    Ok(QuizFilter::new(words.join(" "), category))
}

async fn list(state: &AppState, filter: QuizFilter) -> anyhow::Result<()> {
    let quizzes = state.catalog_service.browse(&filter).await?;
    if quizzes.is_empty() {
        println!("No quizzes match.");
    }
    for quiz in &quizzes {
        println!(
            "{:>5}  {}  [{}, {} min]",
            quiz.id,
            quiz.title,
            quiz.category.display_name(),
            quiz.time_limit_minutes
        );
    }
    Ok(())
}

async fn history(state: &AppState) -> anyhow::Result<()> {
    let (attempts, stats) = state.catalog_service.history().await?;
    println!(
        "Quizzes taken: {}  Average: {}%  Perfect scores: {}",
        stats.taken, stats.average_percentage, stats.perfect_scores
    );
    for entry in &attempts {
        let result = &entry.result;
        println!(
            " {}  {}/{} ({}%)",
            result.submitted_at.format("%Y-%m-%d %H:%M"),
            result.correct_count,
            result.total_questions,
            result.percentage()
        );
    }
    Ok(())
}

async fn attempt(state: &AppState, quiz_id: i64, user_id: Option<i64>) -> anyhow::Result<()> {
    let service = &state.attempt_service;
    let session = service.load(quiz_id, user_id).await?;

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(read_input(tx.clone()));

    let mut view = TerminalView::default();
    match service.run(session, tx, rx, &mut view).await? {
        RunOutcome::Finished(_) => Ok(()),
        RunOutcome::Abandoned => {
            println!("Attempt abandoned, nothing was submitted.");
            Ok(())
        }
    }
}

async fn read_input(events: UnboundedSender<SessionEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read input");
                break;
            }
        };
        let Some(event) = parse_command(&line) else {
            println!("Commands: a-f select, n next, p prev, s submit, r retry, q quit");
            continue;
        };
        if events.send(event).is_err() {
            break;
        }
    }
    let _ = events.send(SessionEvent::Abandon);
}

fn parse_command(line: &str) -> Option<SessionEvent> {
    match line.trim().to_ascii_lowercase().as_str() {
        "n" | "next" => Some(SessionEvent::Next),
        "p" | "prev" => Some(SessionEvent::Prev),
        "s" | "submit" => Some(SessionEvent::Submit),
        "r" | "retry" => Some(SessionEvent::Retry),
        "q" | "quit" => Some(SessionEvent::Abandon),
        other => other.parse::<OptionLetter>().ok().map(SessionEvent::Select),
    }
}

#[derive(Default)]
struct TerminalView {
    last_index: Option<usize>,
    last_state: &'static str,
}

impl SessionObserver for TerminalView {
    fn render(&mut self, session: &AttemptSession) {
        let state = session.state();
        let changed = self.last_state != state.name() || self.last_index != Some(session.current_index());
        self.last_state = state.name();
        self.last_index = Some(session.current_index());

        match state {
            AttemptState::InProgress if changed => {
                if let Some(view) = session.current_question() {
                    println!();
                    println!(
                        "[{}] Question {} of {} ({}%)",
                        format_clock(session.time_left()),
                        view.index + 1,
                        view.total,
                        session.progress_percent()
                    );
                    println!("{}", view.question.question_text);
                    let chosen = view.selected.letters();
                    for (letter, text) in &view.options {
                        let mark = if chosen.contains(letter) { "*" } else { " " };
                        println!(" {} {}) {}", mark, letter, text);
                    }
                }
            }
            AttemptState::InProgress => {
                let left = session.time_left();
                if left % 60 == 0 || left <= 10 {
                    println!("Time left: {}", format_clock(left));
                }
            }
            AttemptState::Submitting if changed => println!("Submitting..."),
            AttemptState::Completed(done) => {
                let result = &done.result;
                println!();
                println!(
                    "Score: {}/{} ({}%) {}",
                    result.obtained_marks,
                    result.total_marks,
                    result.percentage(),
                    if done.passed { "PASSED" } else { "FAILED" }
                );
                println!(
                    "Correct: {}  Incorrect: {}  Time taken: {}",
                    result.correct_count,
                    result.incorrect_count(),
                    format_clock(session.elapsed_seconds())
                );
                for (question, correct) in session.questions().iter().zip(&done.review.per_question_correct) {
                    let mark = if *correct { "ok" } else { "x " };
                    println!(" {} {}", mark, question.question_text);
                    if let Some(explanation) = question.explanation.as_deref() {
                        println!("      {}", explanation);
                    }
                }
            }
            AttemptState::Failed(failure) if changed => {
                println!("{}", failure.message);
                if failure.retryable {
                    println!("Type r or s to retry ({} left), q to quit.", session.remaining_retries());
                }
            }
            _ => {}
        }
    }

    fn notice(&mut self, error: &Error) {
        println!("{}", error.user_message());
    }
}

async fn publish(state: &AppState, path: &str) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path))?;
    let bundle: QuizBundle = serde_json::from_str(&raw).context("parsing quiz bundle")?;
    let service = &state.authoring_service;

    let published = match service.publish(&bundle.quiz, &bundle.questions).await {
        Err(Error::PartialCreation(partial)) => {
            warn!(quiz_id = partial.quiz_id, missing = partial.failed.len(), "Retrying missing questions");
            service.resume(&bundle.questions, &partial).await?
        }
        Err(Error::Validation(report)) => {
            for error in &report.errors {
                eprintln!("{}: {}", error.field, error.message);
            }
            bail!("quiz bundle is invalid");
        }
        other => other?,
    };

    info!(quiz_id = published.quiz_id, questions = published.question_ids.len(), "Published");
    println!("Published quiz {} with {} questions", published.quiz_id, published.question_ids.len());
    Ok(())
}
