use clap::Parser;
use scenario_forge::cli::commands::{
    build_client, build_request, cmd_batch, cmd_convert, cmd_formats, cmd_generate, cmd_validate,
    read_scenarios,
};
use scenario_forge::cli::config::{
    Cli, Commands, load_config, resolve_log_path, resolve_model_config,
};
use scenario_forge::generation::orchestrator::Orchestrator;
use scenario_forge::trace::logger::RunLogger;
use scenario_forge::FormatId;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    // Resolve model settings: CLI > config > env > defaults
    let model_config = resolve_model_config(&cli, &config);
    let log_path = resolve_log_path(&cli, &config);
    let logger = || match &log_path {
        Some(path) => RunLogger::new(path),
        None => RunLogger::disabled(),
    };

    match &cli.command {
        Commands::Generate {
            scenario,
            format,
            base_url,
            tags,
            vars,
            strict,
            output,
            replay,
        } => {
            let request = build_request(
                scenario,
                format,
                base_url.as_deref(),
                tags.as_deref(),
                vars,
                *strict,
            )?;
            let client = build_client(&model_config, replay.as_deref())?;
            let orchestrator =
                Orchestrator::new(client, model_config).with_observer(Box::new(logger()));
            cmd_generate(&orchestrator, &request, output.as_deref())?;
        }
        Commands::Batch {
            file,
            format,
            output_dir,
            base_url,
            tags,
            vars,
            strict,
            replay,
        } => {
            let scenarios = read_scenarios(file)?;
            if scenarios.is_empty() {
                eprintln!("No scenarios found in: {}", file);
                return Ok(());
            }
            let template = build_request(
                "",
                format,
                base_url.as_deref(),
                tags.as_deref(),
                vars,
                *strict,
            )?;
            let client = build_client(&model_config, replay.as_deref())?;
            let orchestrator =
                Orchestrator::new(client, model_config).with_observer(Box::new(logger()));
            let dir = output_dir.as_deref().unwrap_or(&config.output.dir);
            let summary = cmd_batch(&orchestrator, &template, &scenarios, dir)?;
            if !summary.all_succeeded() {
                std::process::exit(1);
            }
        }
        Commands::Validate { file, strict } => {
            if !cmd_validate(file, *strict)? {
                std::process::exit(1);
            }
        }
        Commands::Convert {
            file,
            format,
            output,
            strict,
        } => {
            let format: FormatId = format.parse()?;
            cmd_convert(file, format, output.as_deref(), *strict)?;
        }
        Commands::Formats => cmd_formats(),
    }

    Ok(())
}

/// RUST_LOG wins; otherwise -v raises the level from warn.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("scenario_forge={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
