//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use store_ratings_core::validate::RATING_MAX;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a number with exactly one decimal, e.g. `4` as "4.0".
///
/// Usage in templates: `{{ summary.average|one_decimal }}`
#[askama::filter_fn]
pub fn one_decimal(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let parsed: f64 = value.to_string().parse().unwrap_or(0.0);
    Ok(format!("{parsed:.1}"))
}

/// Renders a rating as five star glyphs, rounding to the nearest whole star.
///
/// Usage in templates: `{{ rating.value|stars }}`
#[askama::filter_fn]
pub fn stars(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(star_glyphs(value.to_string().parse().unwrap_or(0.0)))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn star_glyphs(value: f64) -> String {
    let max = RATING_MAX.unsigned_abs() as usize;
    let filled = (value.round().clamp(0.0, f64::from(RATING_MAX))) as usize;
    let mut out = "\u{2605}".repeat(filled);
    out.push_str(&"\u{2606}".repeat(max - filled));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_glyphs() {
        assert_eq!(star_glyphs(0.0), "\u{2606}".repeat(5));
        assert_eq!(star_glyphs(3.4), "\u{2605}\u{2605}\u{2605}\u{2606}\u{2606}");
        assert_eq!(star_glyphs(4.5), "\u{2605}".repeat(5));
        assert_eq!(star_glyphs(9.0), "\u{2605}".repeat(5));
    }
}
