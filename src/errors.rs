/*!
 * Error types for the slidetran application.
 *
 * This module contains custom error types for different parts of the pipeline,
 * using the thiserror crate for ergonomic error definitions. Each stage of a
 * document pass (read, translate, reinsert, persist) has its own error type so
 * the controller can report failures with the right context.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether a retry of the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Errors raised by the presentation container and its XML parts
#[derive(Error, Debug)]
pub enum DeckError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid presentation archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Malformed XML in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// The run color exists but cannot be expressed as an RGB value
    #[error("Color cannot be resolved to RGB: {0}")]
    ColorResolution(String),

    /// The paragraph has no bullet glyph that could be switched on
    #[error("Bullet cannot be enabled: no bullet definition available")]
    BulletUnavailable,
}

/// Errors while probing a run for a hyperlink.
///
/// These never leave the hyperlink filter: a failed probe counts as "linked".
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HyperlinkProbeError {
    #[error("Hyperlink references unknown relationship '{0}'")]
    DanglingRelationship(String),

    #[error("Malformed hyperlink attribute: {0}")]
    MalformedAttribute(String),
}

/// Errors that can occur during translation of a batch
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider answered, but not with a key/text JSON object
    #[error("Malformed translation response: {0}")]
    MalformedResponse(String),

    /// The provider answered with nothing
    #[error("Provider returned an empty response")]
    EmptyResponse,
}

/// A location no longer matches the structure of the document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationResolutionError {
    #[error("Slide {slide} does not exist")]
    SlideOutOfRange { slide: usize },

    #[error("Shape {shape} does not exist on slide {slide}")]
    ShapeOutOfRange { slide: usize, shape: usize },

    #[error("Shape {shape} on slide {slide} has no text frame")]
    NotATextShape { slide: usize, shape: usize },

    #[error("Shape {shape} on slide {slide} is not a table")]
    NotATable { slide: usize, shape: usize },

    #[error("Cell ({row}, {column}) does not exist in table shape {shape} on slide {slide}")]
    CellOutOfRange {
        slide: usize,
        shape: usize,
        row: usize,
        column: usize,
    },

    #[error("Paragraph {paragraph} does not exist at {container}")]
    ParagraphOutOfRange { container: String, paragraph: usize },
}

/// Errors while writing translations back into a document
#[derive(Error, Debug)]
pub enum ReinsertError {
    #[error("Got {translations} translations for {locations} locations")]
    LengthMismatch { locations: usize, translations: usize },

    #[error("Location resolution failed: {0}")]
    Resolution(#[from] LocationResolutionError),
}

/// Errors while saving a translated document
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Every candidate file name was locked by another process
    #[error("Failed to save presentation after {attempts} attempts, last tried {last_path:?}; close the file in PowerPoint")]
    Locked { attempts: usize, last_path: PathBuf },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize presentation: {0}")]
    Serialize(#[from] DeckError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Input document cannot be opened or parsed
    #[error("Cannot read document {path:?}: {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: DeckError,
    },

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from reinsertion
    #[error("Reinsertion error: {0}")]
    Reinsert(#[from] ReinsertError),

    /// Error from persistence
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
