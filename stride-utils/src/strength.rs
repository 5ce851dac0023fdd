/// Epley estimate: `weight * (1 + reps / 30)`.
pub fn epley_one_rep_max(weight: f64, reps: f64) -> f64 {
    weight * (1.0 + reps / 30.0)
}

/// Total load of a set, `None` unless both weight and reps are non-zero.
pub fn set_load(weight: f64, reps: i16) -> Option<f64> {
    if weight != 0.0 && reps != 0 {
        Some(weight * f64::from(reps))
    } else {
        None
    }
}

/// A set counts towards tracking points only with positive reps and weight.
pub fn is_tracked_set(reps: i16, weight: f64) -> bool {
    reps > 0 && weight > 0.0
}

#[cfg(test)]
mod tests {
    use super::{epley_one_rep_max, is_tracked_set, set_load};

    #[test]
    fn epley_matches_reference_values() {
        assert_eq!(epley_one_rep_max(100.0, 0.0), 100.0);
        assert_eq!(epley_one_rep_max(100.0, 30.0), 200.0);
        assert!((epley_one_rep_max(80.0, 5.0) - 93.333_333).abs() < 1e-4);
    }

    #[test]
    fn load_requires_weight_and_reps() {
        assert_eq!(set_load(60.0, 5), Some(300.0));
        assert_eq!(set_load(0.0, 5), None);
        assert_eq!(set_load(60.0, 0), None);
    }

    #[test]
    fn tracked_sets_need_positive_values() {
        assert!(is_tracked_set(5, 20.0));
        assert!(!is_tracked_set(0, 20.0));
        assert!(!is_tracked_set(5, 0.0));
        assert!(!is_tracked_set(-1, 20.0));
    }
}
