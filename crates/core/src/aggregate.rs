//! Rating aggregation.

use serde::Serialize;

/// Mean of the given star values rounded to one decimal place.
///
/// Returns `0.0` when there are no ratings. Halves round away from zero.
///
/// ```
/// use store_ratings_core::calculate_average_rating;
///
/// assert!((calculate_average_rating(&[5, 4, 3]) - 4.0).abs() < f64::EPSILON);
/// assert!((calculate_average_rating(&[]) - 0.0).abs() < f64::EPSILON);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)] // Rating counts stay far below 2^52
pub fn calculate_average_rating(values: &[i32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: i64 = values.iter().copied().map(i64::from).sum();
    let mean = sum as f64 / values.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// One row of a star distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StarBucket {
    /// Star value, 5 down to 1.
    pub stars: i32,
    /// Number of ratings with this value.
    pub count: usize,
    /// Share of all ratings, 0 to 100.
    pub percentage: f64,
}

/// Count of ratings per star value, from 5 stars down to 1.
///
/// Percentages are 0 when there are no ratings.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rating_distribution(values: &[i32]) -> Vec<StarBucket> {
    let total = values.len();
    (1..=5)
        .rev()
        .map(|stars| {
            let count = values.iter().filter(|&&v| v == stars).count();
            let percentage = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            StarBucket {
                stars,
                count,
                percentage,
            }
        })
        .collect()
}

/// Whether `average` falls in the band `[band, band + 1)`.
///
/// Used by the admin store filter where band 4 keeps stores averaging
/// 4.0 up to but excluding 5.0.
#[must_use]
pub fn in_rating_band(average: f64, band: u8) -> bool {
    let low = f64::from(band);
    average >= low && average < low + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_average_examples() {
        assert!(approx(calculate_average_rating(&[5, 4, 3]), 4.0));
        assert!(approx(calculate_average_rating(&[1, 1, 1, 1]), 1.0));
        assert!(approx(calculate_average_rating(&[]), 0.0));
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        // 13 / 3 = 4.333...
        assert!(approx(calculate_average_rating(&[5, 4, 4]), 4.3));
        // 14 / 3 = 4.666...
        assert!(approx(calculate_average_rating(&[5, 5, 4]), 4.7));
        // 9 / 4 = 2.25, half rounds up
        assert!(approx(calculate_average_rating(&[1, 2, 3, 3]), 2.3));
    }

    #[test]
    fn test_distribution_order_and_counts() {
        let dist = rating_distribution(&[5, 5, 4, 1]);
        let stars: Vec<i32> = dist.iter().map(|b| b.stars).collect();
        assert_eq!(stars, vec![5, 4, 3, 2, 1]);

        let counts: Vec<usize> = dist.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 0, 0, 1]);

        let five = dist.first().map_or(0.0, |b| b.percentage);
        assert!(approx(five, 50.0));
    }

    #[test]
    fn test_distribution_empty() {
        let dist = rating_distribution(&[]);
        assert_eq!(dist.len(), 5);
        assert!(dist.iter().all(|b| b.count == 0 && approx(b.percentage, 0.0)));
    }

    #[test]
    fn test_rating_band() {
        assert!(in_rating_band(4.0, 4));
        assert!(in_rating_band(4.9, 4));
        assert!(!in_rating_band(5.0, 4));
        assert!(in_rating_band(5.0, 5));
        assert!(!in_rating_band(3.9, 4));
        assert!(in_rating_band(0.0, 0));
    }
}
