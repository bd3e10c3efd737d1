use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use bubblegrade::{
    Answer, AnswerKey, ArtifactObserver, DebugDirObserver, GradeReport, GradingPipeline,
    NoopObserver, load_answer_key, open_image,
};

/// Question count used when neither `--questions` nor a key is given.
const DEFAULT_QUESTIONS: usize = 5;

#[derive(Parser)]
#[command(name = "bubblegrade")]
#[command(about = "Grade a photographed multiple-choice bubble sheet")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Answer key as letters in question order, e.g. "B,E,A,D,B"
    #[arg(short, long, conflicts_with = "key_file")]
    key: Option<AnswerKey>,

    /// JSON answer key mapping question index to choice, e.g. {"0": "B", "1": 4}
    #[arg(long, value_name = "FILE")]
    key_file: Option<PathBuf>,

    /// Number of questions on the sheet (defaults to the key length)
    #[arg(short = 'n', long)]
    questions: Option<usize>,

    /// Save intermediate images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    success: bool,
    answers: &'a [Answer],
    total_questions: usize,
    correct: usize,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_key(cli: &Cli) -> anyhow::Result<AnswerKey> {
    if let Some(key) = &cli.key {
        return Ok(key.clone());
    }
    if let Some(path) = &cli.key_file {
        return Ok(load_answer_key(path)?);
    }
    tracing::warn!("No answer key given; every question will be ungraded");
    Ok(AnswerKey::new())
}

fn print_report(report: &GradeReport, json: bool) -> anyhow::Result<()> {
    if json {
        let payload = JsonReport {
            success: true,
            answers: &report.answers,
            total_questions: report.total_questions(),
            correct: report.correct,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for (q, answer) in report.answers.iter().enumerate() {
            println!("{}. {}", q + 1, answer);
        }
        println!("Correct: {}", report.correct);
    }
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let key = load_key(cli)?;
    let num_questions = cli.questions.unwrap_or(match key.question_count() {
        0 => DEFAULT_QUESTIONS,
        n => n,
    });

    tracing::info!("Loading image: {}", cli.image_path.display());
    let img = open_image(&cli.image_path)?;
    tracing::info!("Image size: {}x{}", img.width(), img.height());

    let mut observer: Box<dyn ArtifactObserver> = match &cli.debug_out {
        Some(dir) => Box::new(
            DebugDirObserver::new(dir.clone())
                .with_context(|| format!("Cannot use debug directory {}", dir.display()))?,
        ),
        None => Box::new(NoopObserver),
    };

    let pipeline = GradingPipeline::new();
    let report = pipeline.grade_with_observer(&img, &key, num_questions, observer.as_mut())?;

    print_report(&report, cli.json)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                println!("{}", serde_json::json!({ "error": format!("{e:#}") }));
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
