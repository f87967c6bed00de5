//! CLI entrypoint for consensus-council
//!
//! This is the main entry point that wires together all the layers
//! using dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use council_application::{
    CompositeObserver, ConversationStore, CredentialStore, EnvKeys, PipelineObserver,
    ProviderRegistry, RunConsensusInput, RunConsensusUseCase,
};
use council_domain::{OutputFormat, ProviderFamily, RawQuery};
use council_infrastructure::{
    ConfigLoader, FileConfig, HttpBackendFactory, JsonFileConversationStore, JsonlStageLogger,
};
use council_presentation::{
    Cli, Command, ConsoleFormatter, OutputConfig, OutputFormatter, ProgressReporter,
    SimpleProgress,
};
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };

    // Initialize logging based on verbosity level
    let _log_guard = init_logging(cli.verbose, config.logging.log_file.as_deref())?;

    info!("Starting consensus-council");

    for issue in config.validate() {
        warn!("Config: {}", issue);
    }

    let output = OutputConfig::resolve(
        cli.output.map(Into::into),
        config.output.format,
        config.output.color,
        cli.quiet,
    );
    output.apply_color();

    // Environment keys are re-read on every snapshot
    let credentials = Arc::new(CredentialStore::new(
        config.credentials.to_credentials(EnvKeys::default()),
    ));
    let factory = Arc::new(HttpBackendFactory::new(config.providers.to_endpoints())?);
    let store = Arc::new(JsonFileConversationStore::new(
        config.storage.conversations_dir(),
    ));

    match &cli.command {
        Some(Command::History { limit }) => {
            let mut conversations = store.list().await?;
            if let Some(limit) = limit {
                conversations.truncate(*limit);
            }
            print!("{}", ConsoleFormatter::format_history(&conversations));
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Show { id }) => {
            let Some(conversation) = store.load(id).await? else {
                bail!("No saved conversation with id '{}'", id);
            };
            match output.format {
                OutputFormat::Json => {
                    println!("{}", ConsoleFormatter::format_conversation_json(&conversation))
                }
                OutputFormat::Answer => {
                    print!("{}", ConsoleFormatter::format_answer_only(&conversation.state))
                }
                OutputFormat::Full => {
                    print!("{}", ConsoleFormatter::format_conversation(&conversation))
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Providers) => {
            let registry = ProviderRegistry::new(credentials.snapshot(), factory);
            print!("{}", ConsoleFormatter::format_providers(&registry.provider_status()));
            Ok(ExitCode::SUCCESS)
        }
        None => run_council(&cli, &config, output, credentials, factory, store).await,
    }
}

async fn run_council(
    cli: &Cli,
    config: &FileConfig,
    output: OutputConfig,
    credentials: Arc<CredentialStore>,
    factory: Arc<HttpBackendFactory>,
    store: Arc<JsonFileConversationStore>,
) -> Result<ExitCode> {
    let Some(query) = cli.query_text() else {
        bail!("A query is required. Usage: consensus-council \"<question>\" (see --help)");
    };
    let query = RawQuery::try_new(query)?;

    let preferred_provider = match cli.provider.as_deref() {
        Some(name) => Some(name.parse::<ProviderFamily>()?),
        None => config.run.parse_preferred_provider(),
    };
    let model_count = cli.model_count.unwrap_or(config.run.model_count);

    let mut use_case = RunConsensusUseCase::new(credentials, factory);
    if config.run.save && !cli.no_save {
        use_case = use_case.with_store(store);
    }

    let input = RunConsensusInput::new(query)
        .with_model_count(model_count)
        .with_preferred_provider(preferred_provider);

    // Progress and event log observers
    let reporter = ProgressReporter::new();
    let event_log = config
        .logging
        .event_log
        .as_ref()
        .and_then(JsonlStageLogger::new);

    let mut delegates: Vec<&dyn PipelineObserver> = Vec::new();
    if output.show_progress() {
        if std::io::stderr().is_terminal() {
            delegates.push(&reporter);
        } else {
            delegates.push(&SimpleProgress);
        }
    }
    if let Some(log) = &event_log {
        delegates.push(log);
    }
    let observer = CompositeObserver::new(delegates);

    let state = use_case.execute_with_observer(input, &observer).await;

    print!("{}", ConsoleFormatter.render(&state, output.format));

    if state.is_aborted() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Install the tracing subscriber: stderr always, plus `log_file` when set.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let Some(name) = path.file_name() else {
                bail!("Invalid log file path: {}", path.display());
            };
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
