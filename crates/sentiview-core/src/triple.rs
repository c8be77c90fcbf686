#![forbid(unsafe_code)]

//! Probability triples and the empty-result check.
//!
//! The endpoint encodes "no result, read the `error` field" by sending the
//! empty string for all three probabilities. Only that exact all-empty shape
//! is an error; a triple with one or two empty fields is still data, with the
//! empty fields counting as zero.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::protocol::AnalysisResponse;

/// Sentiment category, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Negative,
    Neutral,
    Positive,
}

impl Category {
    /// All categories in rendering order.
    pub const ALL: [Self; 3] = [Self::Negative, Self::Neutral, Self::Positive];

    /// Display name used in the legend.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
            Self::Positive => "Positive",
        }
    }

    /// Field name in the response body.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Negative => "negatives",
            Self::Neutral => "neutrals",
            Self::Positive => "positives",
        }
    }
}

/// One probability field as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawProbability {
    Number(f64),
    Text(String),
}

impl RawProbability {
    /// The "no result" sentinel.
    pub const EMPTY: Self = Self::Text(String::new());

    /// Whether this is exactly the empty-string sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }

    /// Interpret as a decimal fraction. Blank text counts as `0.0`.
    pub fn to_fraction(&self, category: Category) -> Result<f64, DecodeError> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(0.0);
                }
                trimmed.parse().map_err(|_| DecodeError::NotANumber {
                    category,
                    value: text.clone(),
                })
            }
        }
    }
}

impl Default for RawProbability {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl From<f64> for RawProbability {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawProbability {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// True iff all three fields are the empty-string sentinel.
#[must_use]
pub fn is_empty(negative: &RawProbability, neutral: &RawProbability, positive: &RawProbability) -> bool {
    negative.is_sentinel() && neutral.is_sentinel() && positive.is_sentinel()
}

/// Validated (negative, neutral, positive) distribution.
///
/// Values are trusted once decoded: no range or sum check is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbabilityTriple {
    negative: f64,
    neutral: f64,
    positive: f64,
}

impl ProbabilityTriple {
    #[must_use]
    pub const fn new(negative: f64, neutral: f64, positive: f64) -> Self {
        Self {
            negative,
            neutral,
            positive,
        }
    }

    #[must_use]
    pub const fn negative(&self) -> f64 {
        self.negative
    }

    #[must_use]
    pub const fn neutral(&self) -> f64 {
        self.neutral
    }

    #[must_use]
    pub const fn positive(&self) -> f64 {
        self.positive
    }

    #[must_use]
    pub const fn get(&self, category: Category) -> f64 {
        match category {
            Category::Negative => self.negative,
            Category::Neutral => self.neutral,
            Category::Positive => self.positive,
        }
    }

    /// Fractions in rendering order.
    #[must_use]
    pub const fn fractions(&self) -> [f64; 3] {
        [self.negative, self.neutral, self.positive]
    }
}

/// Interpreted endpoint answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Success { data: ProbabilityTriple },
    Error { message: String },
}

impl AnalysisOutcome {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }
}

/// Turn a response body into an outcome.
///
/// All-empty probabilities become [`AnalysisOutcome::Error`] carrying the
/// response's `error` text, whatever it is (including empty).
pub fn decode(response: &AnalysisResponse) -> Result<AnalysisOutcome, DecodeError> {
    if is_empty(&response.negatives, &response.neutrals, &response.positives) {
        return Ok(AnalysisOutcome::error(response.error.clone()));
    }
    let data = ProbabilityTriple::new(
        response.negatives.to_fraction(Category::Negative)?,
        response.neutrals.to_fraction(Category::Neutral)?,
        response.positives.to_fraction(Category::Positive)?,
    );
    Ok(AnalysisOutcome::Success { data })
}
