use clap::Parser;
use projgraph::config::{AppConfig, Cli};
use projgraph::pipeline::enrich::{enrich_document, interests_or_empty, JsonInterestFile};
use projgraph::pipeline::ingest::{InputSource, RecordSource};
use projgraph::pipeline::run_with_deadline;
use projgraph::{PipelineError, Result};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = match AppConfig::try_from(cli) {
        Ok(config) => config,
        Err(e) => return exit_with(e),
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => return exit_with(PipelineError::TaskFailed(format!("cannot start runtime: {e}"))),
    };
    let result = runtime.block_on(run(config));
    // A timed-out layout may still be running; do not wait for it
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => exit_with(e),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "projgraph=info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn exit_with(e: PipelineError) -> ExitCode {
    error!(error = %e, "projgraph failed");
    if e.is_input_error() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

async fn run(config: AppConfig) -> Result<()> {
    info!("Phase 1: Ingesting project records");
    let records = InputSource::from_arg(&config.input).fetch_project_records()?;

    let interests = config
        .interests
        .as_ref()
        .map(|path| interests_or_empty(&JsonInterestFile::new(path)));

    let outputs = run_with_deadline(records, &config.pipeline, &config.groupings, config.deadline).await?;

    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| PipelineError::io(&config.output_dir, e))?;

    for mut output in outputs {
        if let Some(interests) = &interests {
            info!("Phase 7: Attaching interests");
            enrich_document(&mut output.document, interests);
        }
        let path = config.output_path(output.report.group_by);
        output.document.save_to_file(&path)?;
        info!(path = %path.display(), nodes = output.document.nodes.len(), "saved graph document");
    }
    Ok(())
}
