//! Shared primitive types used across the engine.

/// A region identifier (an Indian state in the shipped configuration).
pub type RegionId = String;

/// A domain label such as "Technology" or "Agriculture".
pub type DomainLabel = String;

/// Round to one decimal place, the precision every report publishes.
///
/// Decides on the exact binary value and sends ties to the even digit, so
/// 6.25 becomes 6.2 and 0.15 (stored just below) becomes 0.1.
pub fn round1(value: f64) -> f64 {
    let scaled = value * 10.0;
    if !scaled.is_finite() || scaled.abs() >= TWO_POW_52 {
        return value;
    }
    // Exact error of the product, so near-ties are judged on the true value.
    let residual = value.mul_add(10.0, -scaled);
    let floor = scaled.floor();
    let above_half = (scaled - floor - 0.5) + residual;
    let rounded = if above_half > 0.0 || (above_half == 0.0 && floor % 2.0 != 0.0) {
        floor + 1.0
    } else {
        floor
    };
    if rounded == 0.0 {
        return 0.0_f64.copysign(value);
    }
    rounded / 10.0
}

const TWO_POW_52: f64 = 4_503_599_627_370_496.0;

/// Percentage of `hits` in `total`, 0 for an empty population.
pub fn percentage(hits: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    hits as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_of_empty_population_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(3, 0), 0.0);
    }

    #[test]
    fn round1_keeps_one_decimal() {
        assert_eq!(round1(29.6000000001), 29.6);
        assert_eq!(round1(1.666_666), 1.7);
        assert!(round1(-0.04).is_sign_negative());
        assert_eq!(round1(-0.04), 0.0);
    }

    #[test]
    fn round1_breaks_ties_on_the_stored_value() {
        assert_eq!(round1(6.25), 6.2);
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(round1(0.75), 0.8);
        assert_eq!(round1(-6.25), -6.2);
        // Stored just below or above the written decimal.
        assert_eq!(round1(0.15), 0.1);
        assert_eq!(round1(0.35), 0.3);
        assert_eq!(round1(0.45), 0.5);
        assert_eq!(round1(2.675), 2.7);
        assert_eq!(round1(100.0), 100.0);
    }
}
