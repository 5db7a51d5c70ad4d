//! Prompt templates for LLM-powered features
//!
//! Templates use plain `format!()` interpolation so a missing variable is a
//! compile-time error.

/// System prompt for sentiment scoring.
///
/// The model is asked for a bare number so the reply can be parsed without a
/// JSON round trip.
pub const SENTIMENT_SYSTEM_PROMPT: &str = "You are a sentiment analysis engine for email. \
Rate the overall sentiment of the message the user sends you on a scale from -1 (very negative) \
to 1 (very positive), where 0 is neutral. Respond with a single number only, no words.";

/// Generate the user prompt for sentiment scoring of an email.
///
/// # Example
/// ```
/// use rapport::llm::prompts::sentiment_prompt;
///
/// let prompt = sentiment_prompt("Thanks for the quick turnaround!");
/// assert!(prompt.contains("quick turnaround"));
/// ```
pub fn sentiment_prompt(text: &str) -> String {
    format!(
        r#"Email:
"""
{text}
"""

Sentiment score (-1 to 1):"#
    )
}
