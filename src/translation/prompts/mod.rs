/*!
 * Prompt construction for slide translation.
 *
 * This module provides:
 * - The fixed system instruction for UI/localization translation
 * - The batch payload (`item_0 .. item_{n-1}`) and the user message around it
 */

pub mod templates;

// Re-export main types
pub use templates::{item_key, payload_of, PromptTemplate, TranslationPromptBuilder, USER_MESSAGE_PREFIX};
