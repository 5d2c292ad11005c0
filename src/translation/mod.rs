/*!
 * Translation of located slide text using AI providers.
 *
 * - `core`: the translation client for one batch, response parsing and key reconciliation
 * - `batch`: splitting into batches and sequential translation of a whole document
 * - `prompts`: system instruction and batch payload
 */

// Re-export main types for easier usage
pub use self::batch::{split_into_batches, BatchTranslator};
pub use self::core::{create_provider, TranslationService};

// Re-export prompt types
pub use self::prompts::{PromptTemplate, TranslationPromptBuilder};

// Submodules
pub mod batch;
pub mod core;
pub mod prompts;
