use std::io::{self, Read};
use std::path::PathBuf;

use ai_llm_service::telemetry;
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Answers questions about hospital patient reviews.
#[derive(Parser, Debug)]
#[command(name = "hospital-review-bot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed the review collection from a JSONL dump.
    Ingest {
        /// Reviews JSONL; defaults to `REVIEWS_DATA_PATH`.
        path: Option<PathBuf>,
    },
    /// Ask a question; read from stdin when no words are given.
    Ask { question: Vec<String> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(telemetry::env_filter("info", &[]))
        .with(telemetry::layer())
        .init();

    dotenv_loaded(env)?;

    match Cli::parse().command {
        Command::Ingest { path } => {
            let n = review_chain::ingest_reviews(path.as_deref())
                .await
                .context("ingesting reviews")?;
            println!("ingested {n} review passages");
        }
        Command::Ask { question } => {
            let question = question_from(question, io::stdin())?;
            let answer = review_chain::ask(&question)
                .await
                .context("answering question")?;
            println!("{answer}");
        }
    }

    Ok(())
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn dotenv_loaded(env: Result<PathBuf, dotenvy::Error>) -> anyhow::Result<()> {
    match env {
        Ok(path) => debug!(path = %path.display(), ".env loaded"),
        Err(e) if e.not_found() => debug!("no .env file"),
        Err(e) => return Err(e).context("loading .env"),
    }
    Ok(())
}

/// Joins CLI words, or reads the whole question from `stdin` when none are given.
fn question_from(words: Vec<String>, mut stdin: impl Read) -> anyhow::Result<String> {
    let question = if words.is_empty() {
        let mut buf = String::new();
        stdin
            .read_to_string(&mut buf)
            .context("reading question from stdin")?;
        buf
    } else {
        words.join(" ")
    };

    let question = question.trim();
    if question.is_empty() {
        bail!("empty question");
    }
    Ok(question.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn words_are_joined_and_stdin_ignored() {
        let q = question_from(words(&["Were", "nurses", "rude?"]), &b"ignored"[..]).unwrap();
        assert_eq!(q, "Were nurses rude?");
    }

    #[test]
    fn stdin_is_read_when_no_words() {
        let q = question_from(Vec::new(), &b"  Was the ward quiet?\n"[..]).unwrap();
        assert_eq!(q, "Was the ward quiet?");
    }

    #[test]
    fn blank_question_is_rejected() {
        assert!(question_from(Vec::new(), &b" \n\t"[..]).is_err());
        assert!(question_from(words(&["", " "]), io::empty()).is_err());
    }

    #[test]
    fn missing_dotenv_is_not_an_error() {
        let not_found = dotenvy::Error::Io(io::Error::from(io::ErrorKind::NotFound));
        assert!(dotenv_loaded(Err(not_found)).is_ok());
        assert!(dotenv_loaded(Ok(PathBuf::from(".env"))).is_ok());
    }

    #[test]
    fn broken_dotenv_is_reported() {
        let malformed = dotenvy::Error::LineParse("OPENAI_API_KEY='unterminated".into(), 14);
        let err = dotenv_loaded(Err(malformed)).unwrap_err();
        assert!(err.to_string().contains("loading .env"));

        let denied = dotenvy::Error::Io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(dotenv_loaded(Err(denied)).is_err());
    }

    #[test]
    fn ask_collects_trailing_words() {
        let cli = Cli::try_parse_from(["hospital-review-bot", "ask", "any", "complaints?"]).unwrap();
        match cli.command {
            Command::Ask { question } => assert_eq!(question, ["any", "complaints?"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ingest_path_is_optional() {
        let cli = Cli::try_parse_from(["hospital-review-bot", "ingest"]).unwrap();
        assert!(matches!(cli.command, Command::Ingest { path: None }));

        let cli = Cli::try_parse_from(["hospital-review-bot", "ingest", "data/r.jsonl"]).unwrap();
        match cli.command {
            Command::Ingest { path } => assert_eq!(path, Some(PathBuf::from("data/r.jsonl"))),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["hospital-review-bot"]).is_err());
    }
}
