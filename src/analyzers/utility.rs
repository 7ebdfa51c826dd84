/// Rounds to `decimals` places, halves to the nearest even digit.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// `part / total * 100`. Returns 0.0 when `total` is zero.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(15.44, 1), 15.4);
        assert_eq!(round_to(33.333333, 2), 33.33);
        assert_eq!(round_to(15.46, 1), 15.5);
    }

    #[test]
    fn test_round_to_halves_go_to_even() {
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(3.5, 0), 4.0);
        assert_eq!(round_to(-2.5, 0), -2.0);
        assert_eq!(round_to(1.25, 1), 1.2);
        assert_eq!(round_to(3.75, 1), 3.8);
        assert_eq!(round_to(pct(1, 800), 2), 0.12);
    }

    #[test]
    fn test_pct() {
        assert_eq!(pct(10, 0), 0.0);
        assert_eq!(pct(50, 100), 50.0);
        assert_eq!(pct(1, 4), 25.0);
    }
}
