/*!
 * Prompt templates for slide translation.
 *
 * The provider receives one system instruction and one user message carrying a
 * JSON object of numbered items; it is asked to answer with the same keys.
 */

/// Text in front of the JSON payload in the user message
pub const USER_MESSAGE_PREFIX: &str = "Translate these items:\n";

/// Payload key of the item at `index`
pub fn item_key(index: usize) -> String {
    format!("item_{}", index)
}

/// System prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// The default system prompt for presentation localization
    pub const SLIDE_TRANSLATOR: &'static str = r#"You are a professional software localization translator. Translate user interface and presentation text from English to Simplified Chinese.

## Rules
- Translate the value of every item; never translate or rename the keys
- Keep technical terms, product names, code, numbers and units accurate
- Preserve every whitespace and control character exactly as in the source, including \u000b (vertical tab), \n (newline), tabs, and leading or trailing spaces
- Do not merge, split, add or drop items

## Output Requirements
- Return ONLY a valid JSON object mapping each key to its translated text
- Do not include any text outside the JSON object"#;

    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    pub fn slide_translator() -> Self {
        Self::new(Self::SLIDE_TRANSLATOR)
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::slide_translator()
    }
}

/// Builds the user message for one batch
#[derive(Debug, Clone, Default)]
pub struct TranslationPromptBuilder {
    items: Vec<String>,
}

impl TranslationPromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items<S: AsRef<str>>(mut self, items: &[S]) -> Self {
        self.items.extend(items.iter().map(|item| item.as_ref().to_string()));
        self
    }

    /// The payload object, keys in positional order, non-ASCII left unescaped
    pub fn build_payload(&self) -> String {
        let payload: serde_json::Map<String, serde_json::Value> = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| (item_key(index), serde_json::Value::String(item.clone())))
            .collect();
        format!("{:#}", serde_json::Value::Object(payload))
    }

    pub fn build_user_message(&self) -> String {
        format!("{}{}", USER_MESSAGE_PREFIX, self.build_payload())
    }
}

/// The payload part of a user message built by [`TranslationPromptBuilder`]
pub fn payload_of(user_message: &str) -> Option<&str> {
    user_message.strip_prefix(USER_MESSAGE_PREFIX)
}
