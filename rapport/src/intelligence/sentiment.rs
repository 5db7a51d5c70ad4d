use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::error::{RapportError, Result};
use crate::llm::{prompts, CompletionOptions, LlmProvider};
use crate::models::Sentiment;

const POSITIVE_WORDS: &[&str] = &[
    "thank",
    "great",
    "excellent",
    "appreciate",
    "happy",
    "love",
    "wonderful",
    "awesome",
    "perfect",
    "glad",
    "pleased",
    "fantastic",
    "congrat",
    "excited",
    "amazing",
];

const NEGATIVE_WORDS: &[&str] = &[
    "sorry",
    "unfortunately",
    "problem",
    "issue",
    "disappointed",
    "frustrated",
    "angry",
    "upset",
    "complaint",
    "wrong",
    "failed",
    "delay",
    "concern",
    "urgent",
    "mistake",
];

const KEYWORD_WEIGHT: f64 = 0.2;

fn number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)").expect("sentiment number pattern is valid")
    })
}

/// Scores message text on `[-1, 1]`.
///
/// Uses the configured LLM when there is one and falls back to a keyword
/// count when there is not, or when the remote call fails or times out.
#[derive(Debug, Clone)]
pub struct SentimentEstimator {
    llm: LlmProvider,
    timeout: Duration,
}

impl SentimentEstimator {
    pub fn new(llm: LlmProvider, timeout_secs: u64) -> Self {
        Self {
            llm,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn uses_llm(&self) -> bool {
        self.llm.is_available()
    }

    /// Never fails; provider errors degrade to the keyword heuristic.
    pub async fn estimate(&self, text: &str) -> Sentiment {
        if text.trim().is_empty() {
            return Sentiment::neutral();
        }

        if !self.llm.is_available() {
            return keyword_sentiment(text);
        }

        self.estimate_remote(text)
            .await
            .unwrap_or_else(|error| {
                tracing::warn!(error = %error, "Remote sentiment failed, using keyword fallback");
                keyword_sentiment(text)
            })
    }

    /// Ask the LLM for a score. Replies without a usable number score 0.
    pub async fn estimate_remote(&self, text: &str) -> Result<Sentiment> {
        let prompt = prompts::sentiment_prompt(text);
        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(10),
        };

        let reply = tokio::time::timeout(
            self.timeout,
            self.llm
                .complete(&prompt, Some(prompts::SENTIMENT_SYSTEM_PROMPT), Some(&options)),
        )
        .await
        .map_err(|_| RapportError::LlmTimeout(self.timeout.as_secs()))??;

        let score = parse_sentiment_reply(&reply);
        tracing::debug!(score, reply_len = reply.len(), "Remote sentiment scored");
        Ok(Sentiment::new(score))
    }
}

/// First number in an LLM reply, or 0 when there is none or it falls outside
/// `[-1, 1]`.
pub fn parse_sentiment_reply(reply: &str) -> f64 {
    number_pattern()
        .find(reply)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|score| score.is_finite() && (-1.0..=1.0).contains(score))
        .unwrap_or(0.0)
}

/// Count positive and negative words (case-insensitive substring match),
/// 0.2 per distinct hit.
pub fn keyword_sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();

    let score = (positive as f64 - negative as f64) * KEYWORD_WEIGHT;
    Sentiment::new(score)
}
