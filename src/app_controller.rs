use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::deck::Presentation;
use crate::errors::{AppError, PersistenceError};
use crate::file_utils::FileManager;
use crate::slides::{locate_text_units, Reinserter};
use crate::translation::{BatchTranslator, TranslationService};

// @module: Application controller for slide deck translation

/// Where one document's pass currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Located,
    Translated,
    Reinserted,
    Persisted,
    Failed,
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Located => "located",
            Self::Translated => "translated",
            Self::Reinserted => "reinserted",
            Self::Persisted => "persisted",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Terminal result of one document's pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Translated copy written to this path
    Persisted(PathBuf),
    /// Nothing to translate; no output written
    Skipped,
    /// The pass failed; the reason is already logged
    Failed(String),
}

/// Outcomes of a folder run, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub outcomes: Vec<(PathBuf, DocumentOutcome)>,
}

impl RunSummary {
    pub fn persisted_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, DocumentOutcome::Persisted(_)))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, DocumentOutcome::Skipped))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, DocumentOutcome::Failed(_)))
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn count(&self, predicate: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| predicate(outcome)).count()
    }
}

/// Main application controller for slide deck translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Batched translation client
    translator: BatchTranslator,
    // @field: Writes translations back into decks
    reinserter: Reinserter,
    // @field: Render progress bars
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let service = TranslationService::from_config(&config.translation)?;
        Ok(Self::with_service(config, service))
    }

    /// Create a controller around an already built translation service
    pub fn with_service(config: Config, service: TranslationService) -> Self {
        let translator = BatchTranslator::from_config(service, &config.translation.common);
        let reinserter = Reinserter::new(config.document.target_font.clone());
        Self {
            config,
            translator,
            reinserter,
            show_progress: true,
        }
    }

    /// Disable progress bars (tests, non-interactive runs)
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check the provider once before a run; failure is only a warning
    pub async fn check_provider(&self) -> bool {
        match self.translator.service().test_connection().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Provider connection test failed: {}", e);
                false
            }
        }
    }

    /// Translate every document in the configured input directory.
    ///
    /// A failed document never stops the run.
    pub async fn run_folder(&self) -> RunSummary {
        let start_time = Instant::now();
        let input_dir = PathBuf::from(&self.config.document.input_dir);
        let mut summary = RunSummary::default();

        if !FileManager::dir_exists(&input_dir) {
            warn!("Input directory does not exist: {:?}", input_dir);
            return summary;
        }
        let files = match FileManager::find_files(&input_dir, &self.config.document.input_extension) {
            Ok(files) => files,
            Err(e) => {
                warn!("Cannot list input directory {:?}: {:#}", input_dir, e);
                return summary;
            }
        };
        if files.is_empty() {
            warn!(
                "No .{} files found in {:?}",
                self.config.document.input_extension, input_dir
            );
            return summary;
        }

        info!("Found {} documents to translate", files.len());
        for file in files {
            let outcome = self.process_document(&file).await;
            summary.outcomes.push((file, outcome));
        }

        info!(
            "Run finished in {}: {} translated, {} skipped, {} failed",
            Self::format_duration(start_time.elapsed()),
            summary.persisted_count(),
            summary.skipped_count(),
            summary.failed_count()
        );
        summary
    }

    /// Run one document through locate, translate, reinsert and persist
    pub async fn process_document(&self, input_file: &Path) -> DocumentOutcome {
        self.process_document_with_writer(input_file, FileManager::write_bytes).await
    }

    /// [`Controller::process_document`] with a custom output writer
    pub async fn process_document_with_writer<W>(&self, input_file: &Path, writer: W) -> DocumentOutcome
    where
        W: FnMut(&Path, &[u8]) -> io::Result<()>,
    {
        let start_time = Instant::now();
        info!("Processing {:?}", input_file);
        let mut state = PassState::Idle;

        let outcome = match self.run_pass(input_file, &mut state, writer).await {
            Ok(Some(path)) => DocumentOutcome::Persisted(path),
            Ok(None) => DocumentOutcome::Skipped,
            Err(e) => {
                let failed_in = state;
                Self::advance(&mut state, PassState::Failed, input_file);
                error!("Failed to translate {:?} after state '{}': {}", input_file, failed_in, e);
                DocumentOutcome::Failed(e.to_string())
            }
        };

        info!(
            "Finished {:?} in {}",
            input_file,
            Self::format_duration(start_time.elapsed())
        );
        outcome
    }

    async fn run_pass<W>(
        &self,
        input_file: &Path,
        state: &mut PassState,
        writer: W,
    ) -> Result<Option<PathBuf>, AppError>
    where
        W: FnMut(&Path, &[u8]) -> io::Result<()>,
    {
        let mut presentation = Presentation::open(input_file).map_err(|source| AppError::DocumentRead {
            path: input_file.to_path_buf(),
            source,
        })?;

        let located = locate_text_units(&presentation);
        Self::advance(state, PassState::Located, input_file);
        if located.is_empty() {
            info!("No translatable text in {:?}, skipping", input_file);
            return Ok(None);
        }
        info!("Located {} text units", located.len());

        let translations = self.translate_with_progress(&located.contents).await?;
        Self::advance(state, PassState::Translated, input_file);

        let report = self
            .reinserter
            .apply_translations(&mut presentation, &located.locations, &translations)?;
        if !report.bullet_failures.is_empty() {
            warn!(
                "{} paragraphs lost their bullet in {:?}",
                report.bullet_failures.len(),
                input_file
            );
        }
        Self::advance(state, PassState::Reinserted, input_file);

        let bytes = presentation.to_bytes().map_err(PersistenceError::Serialize)?;
        let output_dir = PathBuf::from(&self.config.document.output_dir);
        let path = FileManager::save_with_unique_name(
            &bytes,
            input_file,
            &output_dir,
            &self.config.document.output_suffix,
            writer,
        )?;
        Self::advance(state, PassState::Persisted, input_file);
        Ok(Some(path))
    }

    async fn translate_with_progress(&self, texts: &[String]) -> Result<Vec<String>, AppError> {
        let progress_bar = if self.show_progress {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg}")
                .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style.progress_chars("█▓▒░"));
            bar
        } else {
            ProgressBar::hidden()
        };
        progress_bar.set_message(format!(
            "{} - {}",
            self.translator.service().provider_name(),
            self.translator.service().model()
        ));

        let result = self
            .translator
            .translate_all(texts, |done, total| {
                progress_bar.set_length(total as u64);
                progress_bar.set_position(done as u64);
            })
            .await;
        progress_bar.finish_and_clear();
        Ok(result?)
    }

    fn advance(state: &mut PassState, next: PassState, input_file: &Path) {
        debug!("{:?}: {} -> {}", input_file, state, next);
        *state = next;
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
