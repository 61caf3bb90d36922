//! Prompt screening ahead of the upstream call.
//!
//! Rules run in a fixed order and the first failure decides the error code.
//! The denylist is a crude pattern screen, not a sanitizer.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::ValidationConfig;

/// Lower-cased markers that reject a prompt outright
const DENYLIST: &[&str] = &["<script", "javascript:", "data:text/html", "vbscript:"];

/// Inline event handler attributes such as `onerror=` or `onmouseout =`
///
/// Anchored on a tag, quote, slash or whitespace so words like `bonus=` pass.
static EVENT_HANDLER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?:^|[\s<"'/])on[a-z]+\s*="#).ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionCode {
    EmptyPrompt,
    PromptTooLong,
    InsufficientContent,
    HarmfulContent,
    ExcessiveRepetition,
}

impl RejectionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyPrompt => "EMPTY_PROMPT",
            Self::PromptTooLong => "PROMPT_TOO_LONG",
            Self::InsufficientContent => "INSUFFICIENT_CONTENT",
            Self::HarmfulContent => "HARMFUL_CONTENT",
            Self::ExcessiveRepetition => "EXCESSIVE_REPETITION",
        }
    }

    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            Self::EmptyPrompt => &[
                "Please provide a non-empty prompt",
                "Ensure your prompt contains actual text, not just spaces",
            ],
            Self::PromptTooLong => &[
                "Please shorten your prompt",
                "Split long requests into several smaller questions",
            ],
            Self::InsufficientContent => &[
                "Please provide a prompt with at least 2 meaningful characters",
                "Try asking a complete question or making a clear statement",
            ],
            Self::HarmfulContent => &[
                "Please remove any script tags or potentially harmful content",
                "Ensure your prompt contains only safe, plain text",
            ],
            Self::ExcessiveRepetition => &[
                "Please avoid repeating the same character many times",
                "Try rephrasing your prompt with varied content",
            ],
        }
    }
}

/// A prompt the validator refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub code: RejectionCode,
    pub message: String,
}

impl Rejection {
    fn new(code: RejectionCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        self.code
            .suggestions()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

type Check = fn(&PromptValidator, &str, &str) -> Option<Rejection>;

/// Evaluation order; earlier rules shadow later ones
const RULES: &[Check] = &[
    PromptValidator::check_empty,
    PromptValidator::check_length,
    PromptValidator::check_meaningful,
    PromptValidator::check_harmful,
    PromptValidator::check_repetition,
];

#[derive(Debug, Clone)]
pub struct PromptValidator {
    max_length: usize,
    min_meaningful_chars: usize,
    max_char_run: usize,
}

impl Default for PromptValidator {
    fn default() -> Self {
        Self::from_config(&ValidationConfig::default())
    }
}

impl PromptValidator {
    pub fn from_config(config: &ValidationConfig) -> Self {
        Self {
            max_length: config.max_prompt_length,
            min_meaningful_chars: config.min_meaningful_chars,
            max_char_run: config.max_char_run,
        }
    }

    /// Accept a prompt, returning its trimmed form
    pub fn validate(&self, raw: &str) -> Result<String, Rejection> {
        let trimmed = raw.trim();

        for rule in RULES {
            if let Some(rejection) = rule(self, raw, trimmed) {
                return Err(rejection);
            }
        }

        Ok(trimmed.to_string())
    }

    fn check_empty(&self, _raw: &str, trimmed: &str) -> Option<Rejection> {
        trimmed.is_empty().then(|| {
            Rejection::new(
                RejectionCode::EmptyPrompt,
                "Prompt cannot be empty or contain only whitespace",
            )
        })
    }

    fn check_length(&self, raw: &str, _trimmed: &str) -> Option<Rejection> {
        let length = raw.chars().count();
        (length > self.max_length).then(|| {
            Rejection::new(
                RejectionCode::PromptTooLong,
                format!(
                    "Prompt must not exceed {} characters (got {})",
                    self.max_length, length
                ),
            )
        })
    }

    fn check_meaningful(&self, _raw: &str, trimmed: &str) -> Option<Rejection> {
        let meaningful = trimmed
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_ascii_punctuation())
            .take(self.min_meaningful_chars)
            .count();

        (meaningful < self.min_meaningful_chars).then(|| {
            Rejection::new(
                RejectionCode::InsufficientContent,
                format!(
                    "Prompt must contain at least {} meaningful characters",
                    self.min_meaningful_chars
                ),
            )
        })
    }

    fn check_harmful(&self, _raw: &str, trimmed: &str) -> Option<Rejection> {
        let lowered = trimmed.to_lowercase();
        let has_handler = EVENT_HANDLER_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(&lowered));

        (has_handler || DENYLIST.iter().any(|marker| lowered.contains(marker))).then(|| {
            Rejection::new(
                RejectionCode::HarmfulContent,
                "Prompt contains potentially harmful content",
            )
        })
    }

    fn check_repetition(&self, _raw: &str, trimmed: &str) -> Option<Rejection> {
        (longest_run(trimmed) > self.max_char_run).then(|| {
            Rejection::new(
                RejectionCode::ExcessiveRepetition,
                "Prompt contains excessive character repetition",
            )
        })
    }
}

/// Length of the longest unbroken run of one character
fn longest_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous = None;

    for c in text.chars() {
        if previous == Some(c) {
            current += 1;
        } else {
            current = 1;
            previous = Some(c);
        }
        longest = longest.max(current);
    }

    longest
}
