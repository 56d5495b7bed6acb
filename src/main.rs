mod classify;
mod config;
mod decompose;
mod extract;
mod format;
mod llm;
mod pipeline;
mod search;
mod synthesize;

pub const USER_AGENT: &str = concat!("qanun/", env!("CARGO_PKG_VERSION"));

use std::time::Duration;

use clap::Parser;
use reqwest::Client;
use tracing::{error, info};

use classify::detector::HttpDetector;
use classify::lexicon::HttpLexicon;
use config::Config;
use llm::ChatClient;
use pipeline::{AnswerError, Pipeline};
use search::client::CseClient;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout covering DNS + connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum redirect hops before aborting.
const MAX_REDIRECTS: usize = 5;

#[derive(Parser)]
#[command(
    name = "qanun",
    about = "Answer legal questions grounded in trusted online sources, with citations"
)]
struct Args {
    /// The question to answer.
    question: String,

    /// Two-letter country code from the caller's locale (e.g. "AZ").
    #[arg(long)]
    country: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("qanun=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?;

    let pipeline = Pipeline::new(
        http.clone(),
        CseClient::new(http.clone(), &config),
        ChatClient::new(http.clone(), &config),
        HttpDetector::new(http.clone(), &config.detector_base_url),
        HttpLexicon::new(http, &config.lexicon_base_url),
    );

    match pipeline.answer(&args.question, args.country.as_deref()).await {
        Ok(answer) => {
            info!(kind = ?answer.kind, language = answer.language.code(), "answered");
            println!("{}", answer.html);
        }
        Err(AnswerError::EmptyQuestion) => {
            eprintln!("error: question must not be empty");
            std::process::exit(2);
        }
        Err(e @ AnswerError::Synthesis(_)) => {
            error!(error = %e, "synthesis failed");
            println!("{}", pipeline::APOLOGY);
        }
    }

    Ok(())
}
