//! Content safety checks for inbound messages and outbound replies.
//!
//! Pattern checks are intentionally simple and stateless so they can run
//! synchronously on every message without I/O.
//!
//! Decision order for user messages (later scenarios depend on it):
//!   1. Blocked pattern match → block.
//!   2. Length over [`MAX_USER_MESSAGE_CHARS`] → block.
//!   3. Empty after trimming → ignore.
//!   4. Otherwise → process, carrying any soft warnings from the
//!      warning-pattern set. Warnings never block.

use regex::Regex;
use tracing::warn;

/// Hard cap on inbound message length, in characters.
pub const MAX_USER_MESSAGE_CHARS: usize = 2000;
/// Cap on outbound reply length before truncation, in characters.
pub const MAX_RESPONSE_CHARS: usize = 1000;

/// Generic reply substituted whenever a generated response fails validation.
const SAFE_FALLBACK_RESPONSE: &str = "I understand you're reaching out, but I want to make sure \
     I respond in the most helpful way. Could you share a bit more about what's on your mind? 💕";

/// Word-boundary patterns that block a message outright.
const BLOCKED_PATTERNS: &[&str] = &[
    // Medical/clinical advice — outside the bot's lane entirely.
    r"(?i)\b(diagnose|diagnosis|medical|clinical|therapy|therapist|psychiatrist|medication|drug|prescription)\b",
    // Harmful content.
    r"(?i)\b(suicide|kill|murder|violence|abuse|harassment|threat|threaten)\b",
];

/// Word-boundary patterns that attach a soft warning without blocking.
const WARNING_PATTERNS: &[&str] = &[
    // Potentially sensitive topics.
    r"(?i)\b(depression|anxiety|trauma|ptsd|mental health|therapy)\b",
    // Age-related content.
    r"(?i)\b(underage|minor|teen|child|kid)\b",
];

/// What the caller should do with the validated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationAction {
    Block,
    Ignore,
    Process,
    Truncate,
    Send,
}

/// Outcome of a validation pass.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub action: ValidationAction,
    /// Why the text was rejected, for the log line. `None` when valid.
    pub reason: Option<String>,
    /// Soft warnings from the warning-pattern set (user messages only).
    pub warnings: Vec<String>,
    /// The text to send (bot responses only — possibly truncated).
    pub response: Option<String>,
}

impl ValidationResult {
    fn block(reason: &str) -> Self {
        Self {
            is_valid: false,
            action: ValidationAction::Block,
            reason: Some(reason.to_string()),
            warnings: Vec::new(),
            response: None,
        }
    }

    fn ignore(reason: &str) -> Self {
        Self {
            is_valid: false,
            action: ValidationAction::Ignore,
            reason: Some(reason.to_string()),
            warnings: Vec::new(),
            response: None,
        }
    }

    fn process(warnings: Vec<String>) -> Self {
        Self {
            is_valid: true,
            action: ValidationAction::Process,
            reason: None,
            warnings,
            response: None,
        }
    }

    fn truncate(response: String) -> Self {
        Self {
            is_valid: true,
            action: ValidationAction::Truncate,
            reason: None,
            warnings: Vec::new(),
            response: Some(response),
        }
    }

    fn send(response: String) -> Self {
        Self {
            is_valid: true,
            action: ValidationAction::Send,
            reason: None,
            warnings: Vec::new(),
            response: Some(response),
        }
    }
}

/// Compiled pattern sets, built once at startup and shared read-only.
pub struct SafetyFilter {
    blocked: Vec<Regex>,
    warning: Vec<Regex>,
    newline_runs: Regex,
}

impl Default for SafetyFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyFilter {
    pub fn new() -> Self {
        Self {
            blocked: compile(BLOCKED_PATTERNS),
            warning: compile(WARNING_PATTERNS),
            newline_runs: Regex::new(r"\n{3,}").expect("hardcoded pattern compiles"),
        }
    }

    /// Validate an inbound user message. See the module docs for ordering.
    pub fn validate_user_message(&self, message: &str) -> ValidationResult {
        for pattern in &self.blocked {
            if pattern.is_match(message) {
                warn!(pattern = %pattern.as_str(), "blocked user message");
                return ValidationResult::block("Content contains inappropriate material");
            }
        }

        if message.chars().count() > MAX_USER_MESSAGE_CHARS {
            return ValidationResult::block("Message too long");
        }

        if message.trim().is_empty() {
            return ValidationResult::ignore("Empty message");
        }

        let warnings: Vec<String> = self
            .warning
            .iter()
            .filter(|p| p.is_match(message))
            .map(|p| format!("Sensitive topic detected: {}", p.as_str()))
            .collect();

        ValidationResult::process(warnings)
    }

    /// Validate an outbound bot response.
    ///
    /// Over-length responses are cut to [`MAX_RESPONSE_CHARS`] characters
    /// plus an ellipsis marker. The truncated text is NOT re-checked
    /// against the blocked patterns.
    pub fn validate_bot_response(&self, response: &str) -> ValidationResult {
        for pattern in &self.blocked {
            if pattern.is_match(response) {
                warn!(pattern = %pattern.as_str(), "blocked bot response");
                return ValidationResult::block("Response contains inappropriate material");
            }
        }

        if response.chars().count() > MAX_RESPONSE_CHARS {
            warn!("bot response too long, truncating");
            let mut cut: String = response.chars().take(MAX_RESPONSE_CHARS).collect();
            cut.push_str("...");
            return ValidationResult::truncate(cut);
        }

        if response.trim().is_empty() {
            return ValidationResult::block("Empty response");
        }

        ValidationResult::send(response.to_string())
    }

    /// Totalized response validation: always yields sendable text.
    ///
    /// Any non-valid result is replaced with the fixed generic safe reply,
    /// so the pipeline never has to handle a validation failure here.
    pub fn get_safe_response(&self, original: &str) -> String {
        let validation = self.validate_bot_response(original);
        if !validation.is_valid {
            return SAFE_FALLBACK_RESPONSE.to_string();
        }
        validation
            .response
            .unwrap_or_else(|| SAFE_FALLBACK_RESPONSE.to_string())
    }

    /// Optional hardening pass: strips angle brackets, collapses 3+
    /// consecutive newlines to 2, trims. `None` when nothing survives.
    pub fn sanitize_message(&self, message: &str) -> Option<String> {
        let without_brackets: String = message.chars().filter(|c| !matches!(c, '<' | '>')).collect();
        let collapsed = self.newline_runs.replace_all(&without_brackets, "\n\n");
        let trimmed = collapsed.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("hardcoded pattern compiles"))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
