use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use doclens::config::Config;
use doclens::correction::TextCorrector;
use doclens::error::DocLensError;
use doclens::ocr::OcrProvider;
use doclens::output::{Artifact, OutputWriter};
use doclens::pipeline::{Pipeline, PipelineOutcome, Stage};
use doclens::summarize::Summarizer;

#[derive(Parser)]
#[command(name = "doclens")]
#[command(about = "Extract, correct and summarize the text in an image")]
struct Args {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// OCR the image, correct the text, then summarize it
    Run {
        image: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
        /// Also write the layout-aware hOCR document
        #[arg(long)]
        hocr: bool,
        /// Also write report.json describing the run
        #[arg(long)]
        report: bool,
        /// Skip grammar and spelling correction
        #[arg(long)]
        no_correct: bool,
        /// Override SUMMARY_MODEL, e.g. ollama/llama3.2
        #[arg(long)]
        summary_model: Option<String>,
    },
    /// Extract text from an image
    Ocr {
        image: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
        /// Also write the layout-aware hOCR document
        #[arg(long)]
        hocr: bool,
    },
    /// Correct grammar and spelling in a piece of text
    Correct {
        #[command(flatten)]
        input: TextInput,
    },
    /// Summarize a piece of text
    Summarize {
        #[command(flatten)]
        input: TextInput,
        /// Override SUMMARY_MODEL, e.g. ollama/llama3.2
        #[arg(long)]
        summary_model: Option<String>,
    },
}

#[derive(ClapArgs)]
struct OutputArgs {
    /// Directory for the written files (defaults to OUTPUT_DIR or .)
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,
}

#[derive(ClapArgs)]
struct TextInput {
    /// Text to process
    #[arg(conflicts_with = "file", required_unless_present = "file")]
    text: Option<String>,
    /// Read the text from a file instead
    #[arg(long)]
    file: Option<PathBuf>,
}

impl TextInput {
    async fn read(&self) -> anyhow::Result<String> {
        match (&self.text, &self.file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => Ok(tokio::fs::read_to_string(path).await?),
            (None, None) => anyhow::bail!("no input text given"),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    init_tracing(args.log_json);

    let config = Config::from_env();

    match execute(args.command, config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            if e
                .downcast_ref::<DocLensError>()
                .is_some_and(DocLensError::is_unavailable)
            {
                eprintln!("Check the backend settings in your environment or .env file.");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "doclens=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn execute(command: Command, mut config: Config) -> anyhow::Result<ExitCode> {
    match command {
        Command::Run {
            image,
            output,
            hocr,
            report,
            no_correct,
            summary_model,
        } => {
            apply_output_args(&mut config, &output);
            config.output.write_hocr |= hocr;
            config.output.write_report |= report;
            if no_correct {
                config.correction.enabled = false;
            }
            if let Some(model) = summary_model {
                config.summarizer.model = model;
            }
            run_pipeline(&config, &image).await
        }
        Command::Ocr {
            image,
            output,
            hocr,
        } => {
            apply_output_args(&mut config, &output);
            run_ocr(&config, &image, hocr || config.output.write_hocr).await
        }
        Command::Correct { input } => {
            let text = input.read().await?;
            let corrector = TextCorrector::new(&config.correction);
            let result = corrector.correct(&text).await?;

            print_section("Original Text", &text);
            print_section("Corrected Text", &result.text);
            for edit in &result.applied {
                println!(
                    "  [{}] {:?} -> {:?}: {}",
                    edit.rule_id, edit.original, edit.replacement, edit.message
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Summarize {
            input,
            summary_model,
        } => {
            if let Some(model) = summary_model {
                config.summarizer.model = model;
            }
            let text = input.read().await?;
            let summary = Summarizer::new(&config.summarizer).summarize(&text).await?;
            print_section(Stage::Summarized.title(), &summary);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn apply_output_args(config: &mut Config, output: &OutputArgs) {
    if let Some(dir) = &output.output_dir {
        config.output.dir = dir.clone();
    }
}

async fn run_pipeline(config: &Config, image: &Path) -> anyhow::Result<ExitCode> {
    let pipeline = Pipeline::from_config(config)?;

    let outcome = pipeline
        .run(image, |stage, text| print_section(stage.title(), text))
        .await?;

    match outcome {
        PipelineOutcome::NoText { .. } => {
            println!("No text found in the image.");
        }
        PipelineOutcome::Completed(artifacts) => {
            let names: Vec<String> = artifacts
                .files
                .iter()
                .map(|path| format!("'{}'", path.display()))
                .collect();
            println!("\nAll outputs have been saved to {}.", names.join(", "));
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_ocr(config: &Config, image: &Path, with_hocr: bool) -> anyhow::Result<ExitCode> {
    let ocr = OcrProvider::new(&config.ocr)?;
    let image = doclens::loader::load_image(image).await?;
    let output = ocr.extract(&image, with_hocr).await?;

    if output.is_empty() {
        println!("No text found in the image.");
        return Ok(ExitCode::SUCCESS);
    }

    print_section(Stage::Extracted.title(), &output.text);

    let writer = OutputWriter::new(&config.output.dir);
    let mut written = vec![writer.write(Artifact::ExtractedText, &output.text).await?];
    if let Some(hocr) = &output.hocr {
        written.push(writer.write(Artifact::Hocr, hocr).await?);
    }
    for path in written {
        println!("Saved '{}'.", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

fn print_section(title: &str, text: &str) {
    println!("\n--- {title} ---\n");
    println!("{text}");
}
