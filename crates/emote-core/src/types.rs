use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Facial expression label reported by the expression model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    Happy,
    Sad,
    Anger,
    Neutral,
    Surprised,
    Fear,
}

impl Expression {
    /// Every label in priority order. Argmax ties resolve to the earliest entry.
    pub const ALL: [Expression; 6] = [
        Expression::Happy,
        Expression::Sad,
        Expression::Anger,
        Expression::Neutral,
        Expression::Surprised,
        Expression::Fear,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Anger => "anger",
            Expression::Neutral => "neutral",
            Expression::Surprised => "surprised",
            Expression::Fear => "fear",
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown expression label: {0}")]
pub struct UnknownExpression(pub String);

impl FromStr for Expression {
    type Err = UnknownExpression;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expression::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| UnknownExpression(s.to_string()))
    }
}

/// Per-label probabilities for one detected face.
///
/// Each value is expected in [0, 1]; the set is not required to sum to 1.
/// Labels missing from serialized input read as 0.0 and unknown keys are
/// ignored, so raw model output with extra labels deserializes as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionVector {
    pub happy: f64,
    pub sad: f64,
    pub anger: f64,
    pub neutral: f64,
    pub surprised: f64,
    pub fear: f64,
}

impl ExpressionVector {
    /// Probability for a single label.
    pub fn get(&self, label: Expression) -> f64 {
        match label {
            Expression::Happy => self.happy,
            Expression::Sad => self.sad,
            Expression::Anger => self.anger,
            Expression::Neutral => self.neutral,
            Expression::Surprised => self.surprised,
            Expression::Fear => self.fear,
        }
    }

    /// Iterate `(label, probability)` pairs in [`Expression::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Expression, f64)> + '_ {
        Expression::ALL.into_iter().map(move |label| (label, self.get(label)))
    }
}

/// RGB color derived from an expression vector.
///
/// Channels are weighted sums and are NOT clamped: overlapping labels can
/// push a channel past 255 (up to 766 for red).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayColor {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl fmt::Display for DisplayColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.red, self.green, self.blue)
    }
}
