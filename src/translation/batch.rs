/*!
 * Batch translation processing.
 *
 * This module splits the located texts of one document into fixed-size batches
 * and translates them one after another, pausing between requests. Results are
 * assembled in batch order, so translation `i` always belongs to source `i`.
 */

use log::{debug, error, info};
use std::time::{Duration, Instant};

use super::core::TranslationService;
use crate::app_config::{BatchFailurePolicy, TranslationCommonConfig};
use crate::errors::TranslationError;

/// Split `items` into contiguous batches of at most `size` elements.
///
/// A size of 0 is treated as 1. Empty input gives no batches.
pub fn split_into_batches<T>(items: &[T], size: usize) -> Vec<&[T]> {
    items.chunks(size.max(1)).collect()
}

/// Batch translator for the texts of one document
#[derive(Debug, Clone)]
pub struct BatchTranslator {
    /// The translation service to use
    service: TranslationService,
    batch_size: usize,
    /// Pause between consecutive batch requests
    pause: Duration,
    failure_policy: BatchFailurePolicy,
}

impl BatchTranslator {
    pub fn new(service: TranslationService, batch_size: usize, pause: Duration) -> Self {
        Self {
            service,
            batch_size: batch_size.max(1),
            pause,
            failure_policy: BatchFailurePolicy::Abort,
        }
    }

    pub fn from_config(service: TranslationService, common: &TranslationCommonConfig) -> Self {
        Self::new(service, common.batch_size, Duration::from_millis(common.batch_pause_ms))
            .with_failure_policy(common.on_batch_failure)
    }

    pub fn with_failure_policy(mut self, policy: BatchFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn service(&self) -> &TranslationService {
        &self.service
    }

    /// Translate all texts sequentially, batch by batch.
    ///
    /// `progress_callback(done, total)` runs after every batch. With
    /// `BatchFailurePolicy::Abort` the first failed batch ends the run; with
    /// `KeepSource` the failed batch keeps its source texts.
    pub async fn translate_all(
        &self,
        texts: &[String],
        progress_callback: impl Fn(usize, usize),
    ) -> Result<Vec<String>, TranslationError> {
        let batches = split_into_batches(texts, self.batch_size);
        let total_batches = batches.len();
        let mut translations = Vec::with_capacity(texts.len());

        for (batch_index, batch) in batches.into_iter().enumerate() {
            if batch_index > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            debug!(
                "Translating batch {}/{} ({} items)",
                batch_index + 1,
                total_batches,
                batch.len()
            );
            let start_time = Instant::now();
            match self.service.translate_batch(batch).await {
                Ok(translated) => {
                    debug!("Batch {} completed in {:?}", batch_index + 1, start_time.elapsed());
                    translations.extend(translated);
                }
                Err(e) => match self.failure_policy {
                    BatchFailurePolicy::Abort => {
                        error!("Batch {}/{} failed: {}", batch_index + 1, total_batches, e);
                        return Err(e);
                    }
                    BatchFailurePolicy::KeepSource => {
                        error!(
                            "Batch {}/{} failed, keeping source text: {}",
                            batch_index + 1,
                            total_batches,
                            e
                        );
                        translations.extend(batch.iter().cloned());
                    }
                },
            }
            progress_callback(batch_index + 1, total_batches);
        }

        info!("Translated {} texts in {} batches", translations.len(), total_batches);
        Ok(translations)
    }
}
