//! Character-budget truncation for assembled generation context.

use serde::Serialize;

/// A message in the shape the chat-completion API expects.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct WireMessage {
    pub role: &'static str,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Trim `messages` to fit a character budget.
///
/// The leading system prompt is always retained, whatever its length.
/// The remaining messages are walked newest → oldest, accumulating
/// content length; the walk stops the moment the running total would
/// exceed `max_chars`, silently discarding everything older. The
/// retained subset is returned oldest-first after the system prompt, so
/// the newest user message is never the one dropped in favor of an
/// older turn.
pub(crate) fn truncate_context(messages: &[WireMessage], max_chars: usize) -> Vec<WireMessage> {
    let mut total = 0usize;
    let mut truncated: Vec<WireMessage> = Vec::with_capacity(messages.len());

    let rest = match messages.first() {
        Some(system) if system.role == "system" => {
            total += system.content.len();
            truncated.push(system.clone());
            &messages[1..]
        }
        _ => messages,
    };

    let mut kept: Vec<WireMessage> = Vec::new();
    for message in rest.iter().rev() {
        let length = message.content.len();
        if total + length > max_chars {
            break;
        }
        kept.push(message.clone());
        total += length;
    }
    kept.reverse();
    truncated.extend(kept);

    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(len: usize) -> WireMessage {
        WireMessage::new("system", "s".repeat(len))
    }

    fn turn(role: &'static str, len: usize) -> WireMessage {
        WireMessage::new(role, "x".repeat(len))
    }

    #[test]
    fn everything_fits_untouched() {
        let messages = vec![system(100), turn("user", 100), turn("assistant", 100)];
        let result = truncate_context(&messages, 4000);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn system_prompt_survives_even_over_budget() {
        let messages = vec![system(5000), turn("user", 10)];
        let result = truncate_context(&messages, 4000);
        assert_eq!(result[0].role, "system");
        // The system prompt alone blew the budget, so nothing else fits.
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn oldest_turns_are_dropped_first() {
        let messages = vec![
            system(1000),
            turn("user", 1500),      // oldest — dropped
            turn("assistant", 1400), // kept
            turn("user", 1500),      // newest — kept
        ];
        let result = truncate_context(&messages, 4000);
        assert_eq!(result.len(), 3);
        assert_eq!(result[1].role, "assistant");
        assert_eq!(result[2].role, "user");
    }

    #[test]
    fn newest_message_retained_when_it_alone_fits() {
        let messages = vec![system(1000), turn("assistant", 3500), turn("user", 2000)];
        let result = truncate_context(&messages, 4000);
        assert_eq!(result.len(), 2);
        assert_eq!(result[1].role, "user");
    }

    #[test]
    fn retained_order_is_oldest_first() {
        let messages = vec![
            system(10),
            WireMessage::new("user", "one"),
            WireMessage::new("assistant", "two"),
            WireMessage::new("user", "three"),
        ];
        let result = truncate_context(&messages, 4000);
        assert_eq!(result[0].role, "system");
        let contents: Vec<&str> = result[1..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["one", "two", "three"]);
    }

    #[test]
    fn no_system_prompt_still_truncates() {
        let messages = vec![turn("user", 3000), turn("user", 3000)];
        let result = truncate_context(&messages, 4000);
        assert_eq!(result.len(), 1);
    }
}
