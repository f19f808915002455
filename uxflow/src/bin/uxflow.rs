//! Command-line driver for the critique pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::stream::{self, StreamExt};

use uxflow::config::PipelineConfig;
use uxflow::core::ScreenshotRef;
use uxflow::events::{LoggingEventSink, ProgressNotifier, ProgressSubscription};
use uxflow::model::gemini::GeminiClient;
use uxflow::observability::{init_tracing, LogFormat};
use uxflow::pipeline::{PipelineOrchestrator, PipelineService};
use uxflow::store::FileResultStore;

#[derive(Debug, Parser)]
#[command(name = "uxflow", version, about = "Critique mobile UI screenshots")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run all four stages for each screenshot.
    Run {
        screenshots: Vec<PathBuf>,
        /// Screenshots processed at once.
        #[arg(long, default_value_t = 2)]
        concurrency: usize,
    },
    /// Run vision, heuristics and feedback only.
    Evaluate { screenshot: PathBuf },
    /// Generate the wireframe for an evaluated run.
    Wireframe { run_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)
            .await
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let model = Arc::new(GeminiClient::from_config(&config.model)?);
    let store = Arc::new(FileResultStore::new(&config.output_dir));
    let notifier = Arc::new(ProgressNotifier::new());
    let orchestrator = PipelineOrchestrator::from_config(model, store, &config)
        .with_progress(notifier.clone())
        .with_events(Arc::new(LoggingEventSink::debug()));
    let service = PipelineService::new(Arc::new(orchestrator));

    match cli.command {
        Command::Run {
            screenshots,
            concurrency,
        } => {
            let results: Vec<Result<()>> = stream::iter(screenshots.into_iter().enumerate())
                .map(|(index, path)| run_one(&service, &notifier, &config, index, path))
                .buffer_unordered(concurrency.max(1))
                .collect()
                .await;

            let failures = results.iter().filter(|r| r.is_err()).count();
            for err in results.into_iter().filter_map(Result::err) {
                eprintln!("error: {err:#}");
            }
            if failures > 0 {
                anyhow::bail!("{failures} screenshot(s) failed");
            }
        }
        Command::Evaluate { screenshot } => {
            let client_id = screenshot.display().to_string();
            let printer = print_progress(notifier.register(&client_id));

            let shot = load(&screenshot).await?;
            let (run_id, report) = service.evaluate(&shot, Some(&client_id)).await?;
            notifier.unregister(&client_id);
            printer.await?;

            println!("run {run_id}: {} issue(s)", report.total_issues());
            println!(
                "feedback: {}",
                config.output_dir.join(run_id.to_string()).join("feedback.md").display()
            );
        }
        Command::Wireframe { run_id } => {
            let wireframe = service.generate_wireframe(&run_id, None).await?;
            println!(
                "wireframe ({} bytes): {}",
                wireframe.len(),
                config.output_dir.join(&run_id).join("wireframe.html").display()
            );
        }
    }

    Ok(())
}

async fn run_one(
    service: &PipelineService,
    notifier: &ProgressNotifier,
    config: &PipelineConfig,
    index: usize,
    path: PathBuf,
) -> Result<()> {
    // The same file may be listed twice; each entry gets its own progress stream.
    let client_id = progress_client_id(index, &path);
    let printer = print_progress(notifier.register(&client_id));

    let result = async {
        let shot = load(&path).await?;
        Ok::<_, anyhow::Error>(service.run(&shot, Some(&client_id)).await?)
    }
    .await;
    notifier.unregister(&client_id);
    printer.await?;

    let outcome = result.with_context(|| format!("processing {}", path.display()))?;
    let run_dir = config.output_dir.join(outcome.run_id().to_string());
    println!(
        "{}: run {} done, {} issue(s), artifacts in {}",
        path.display(),
        outcome.run_id(),
        outcome.feedback().total_issues(),
        run_dir.display()
    );
    Ok(())
}

fn progress_client_id(index: usize, path: &Path) -> String {
    format!("#{index} {}", path.display())
}

async fn load(path: &Path) -> Result<ScreenshotRef> {
    ScreenshotRef::from_path(path)
        .await
        .with_context(|| format!("reading screenshot {}", path.display()))
}

fn print_progress(mut subscription: ProgressSubscription) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            println!(
                "[{}] step {}/4: {}",
                subscription.client_id(),
                event.step,
                event.message
            );
        }
    })
}
