//! Expression vector → display color and dominant label.
//!
//! Both functions are pure: the result depends only on the vector passed in.

use crate::types::{DisplayColor, Expression, ExpressionVector};

// Per-label channel weights.
const FULL: f64 = 255.0;
const HALF: f64 = 128.0;
const ORANGE_GREEN: f64 = 165.0;

/// Compute the gradient color for an expression vector.
///
/// ```text
/// red   = 255*anger + 255*happy + 128*surprised + 128*fear
/// green = 255*happy + 255*neutral + 165*surprised
/// blue  = 255*sad   + 128*neutral + 255*fear
/// ```
///
/// Terms are summed in the order shown and each channel is rounded half-up.
/// No normalization and no clamping to 255.
pub fn compute_color(v: &ExpressionVector) -> DisplayColor {
    let red = v.anger * FULL + v.happy * FULL + v.surprised * HALF + v.fear * HALF;
    let green = v.happy * FULL + v.neutral * FULL + v.surprised * ORANGE_GREEN;
    let blue = v.sad * FULL + v.neutral * HALF + v.fear * FULL;

    DisplayColor {
        red: channel(red),
        green: channel(green),
        blue: channel(blue),
    }
}

/// Round a weighted sum to an integer channel.
///
/// For non-negative input `round()` matches half-up rounding. Float → int
/// `as` casts saturate, so NaN and negative sums land on 0.
fn channel(value: f64) -> u16 {
    value.round() as u16
}

/// Pick the label with the highest probability.
///
/// Labels are scanned in [`Expression::ALL`] order and only a strictly
/// greater probability replaces the current best, so exact ties go to the
/// label that comes first.
pub fn dominant_label(v: &ExpressionVector) -> Expression {
    let mut best = Expression::ALL[0];
    let mut best_p = v.get(best);

    for label in &Expression::ALL[1..] {
        let p = v.get(*label);
        if p > best_p {
            best = *label;
            best_p = p;
        }
    }

    best
}
