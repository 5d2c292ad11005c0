// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

use slidetran::app_config::{Config, LogLevel, TranslationProvider};
use slidetran::app_controller::{Controller, DocumentOutcome};
use slidetran::file_utils::FileManager;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(name = "openai")]
    OpenAI,
    Ollama,
    Anthropic,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for slidetran
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// slidetran - translate PowerPoint decks into Simplified Chinese
#[derive(Parser, Debug)]
#[command(name = "slidetran")]
#[command(version)]
#[command(about = "AI-powered slide deck translation tool")]
#[command(long_about = "slidetran translates every .pptx file in an input folder into Simplified Chinese
and writes a copy with the same layout and formatting to an output folder.

EXAMPLES:
    slidetran                                    # Translate ./input into ./output
    slidetran --input-dir decks --output-dir cn  # Use other folders
    slidetran -p ollama -m qwen2.5:7b            # Use a local Ollama model
    slidetran -b 10 --log-level debug            # Smaller batches, verbose logging
    slidetran completions bash > slidetran.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. API keys may also come from OPENAI_API_KEY or
    ANTHROPIC_API_KEY, including via a .env file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Folder containing the decks to translate
    #[arg(long, value_name = "DIR")]
    input_dir: Option<String>,

    /// Folder receiving the translated decks
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Number of text units sent per request
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// Session log file, set once the configuration is known
static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger; verbosity is controlled with log::set_max_level
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌",
            Level::Warn => "🚧",
            Level::Info => "  ",
            Level::Debug => "🔍",
            Level::Trace => "📋",
        }
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let level = record.level();
        let _ = writeln!(
            std::io::stderr(),
            "{}{} {} {}\x1B[0m",
            Self::color_for_level(level),
            now,
            Self::get_emoji_for_level(level),
            record.args()
        );

        if let Some(path) = LOG_FILE.get() {
            let _ = FileManager::append_to_log_file(path, &format!("{:<5} {}", level, record.args()));
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;
    dotenv::dotenv().ok();

    let cli = CommandLineOptions::parse();
    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "slidetran", &mut std::io::stdout());
        return Ok(());
    }

    run_translate(cli).await
}

async fn run_translate(options: CommandLineOptions) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, &options);
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    if !config.log_dir.is_empty() {
        let log_path = FileManager::session_log_path(&config.log_dir);
        match FileManager::ensure_dir(&config.log_dir) {
            Ok(()) => {
                let _ = LOG_FILE.set(log_path.clone());
                info!("Logging to {:?}", log_path);
            }
            Err(e) => warn!("File logging disabled: {:#}", e),
        }
    }

    info!(
        "Using {} with model {}",
        config.translation.provider.display_name(),
        config.translation.get_model()
    );

    let controller = Controller::with_config(config)?;
    controller.check_provider().await;

    let summary = controller.run_folder().await;
    for (path, outcome) in &summary.outcomes {
        match outcome {
            DocumentOutcome::Persisted(output) => info!("Success: {:?} -> {:?}", path, output),
            DocumentOutcome::Skipped => info!("Skipped: {:?}", path),
            DocumentOutcome::Failed(reason) => warn!("Failed: {:?}: {}", path, reason),
        }
    }
    info!(
        "{} translated, {} skipped, {} failed",
        summary.persisted_count(),
        summary.skipped_count(),
        summary.failed_count()
    );

    Ok(())
}

fn apply_overrides(config: &mut Config, options: &CommandLineOptions) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.set_model(model.clone());
    }
    if let Some(batch_size) = options.batch_size {
        config.translation.common.batch_size = batch_size;
    }
    if let Some(input_dir) = &options.input_dir {
        config.document.input_dir = input_dir.clone();
    }
    if let Some(output_dir) = &options.output_dir {
        config.document.output_dir = output_dir.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}
