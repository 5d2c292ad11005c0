/*!
 * # slidetran - PowerPoint deck translation with AI
 *
 * A Rust library that translates the text of `.pptx` presentations into
 * Simplified Chinese while keeping the slide layout and text formatting.
 *
 * ## Features
 *
 * - Locate every translatable paragraph in text shapes and table cells
 * - Leave hyperlinked text untouched
 * - Translate in batches using various AI providers:
 *   - OpenAI API
 *   - Anthropic API
 *   - Ollama (local LLM)
 *   - LM Studio (OpenAI-compatible local server)
 * - Write translations back with alignment, level, indentation, bullets,
 *   font size and color restored, and the target font applied
 * - Save next to a locked output file under a new name
 *
 * ## Architecture
 *
 * - `deck`: the presentation container, slide XML and shape model
 * - `slides`: text location, hyperlink filter, formatting snapshot and reinsertion
 * - `translation`: AI-powered translation:
 *   - `translation::core`: the batch translation client
 *   - `translation::batch`: batching of a whole document
 *   - `translation::prompts`: system instruction and payload
 * - `providers`: Client implementations for various LLM providers
 * - `app_config`: Configuration management
 * - `app_controller`: Per-document pipeline and folder runs
 * - `file_utils`: File system operations and output naming
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod deck;
pub mod errors;
pub mod file_utils;
pub mod providers;
pub mod slides;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, DocumentOutcome, RunSummary};
pub use deck::Presentation;
pub use errors::{AppError, DeckError, PersistenceError, ProviderError, ReinsertError, TranslationError};
pub use slides::{locate_text_units, LocatedText, Location, Reinserter};
pub use translation::TranslationService;
