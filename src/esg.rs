//! ESG effects: the three-tier step function on the cumulative score.
//!
//! The cumulative score acts twice, by design: as a revenue multiplier at the
//! round close (raw score against the tier thresholds), and as a normalised
//! `[0, 1]` component inside the competitive score.

use crate::config::EsgParams;

/// Revenue multiplier for a cumulative ESG score.
///
/// At or above the high threshold the high bonus applies; between mid and
/// high the mid bonus; below mid a linear penalty ramps from `low_penalty_min`
/// just under the threshold to `low_penalty_max` at zero.
pub fn revenue_multiplier(esg_score: f64, params: &EsgParams) -> f64 {
    let score = esg_score.max(0.0);
    if score >= params.high_threshold {
        1.0 + params.high_bonus
    } else if score >= params.mid_threshold {
        1.0 + params.mid_bonus
    } else {
        let span = (params.mid_threshold - 1.0).max(1.0);
        let shortfall = ((params.mid_threshold - 1.0) - score).max(0.0) / span;
        let penalty = params.low_penalty_min
            + (params.low_penalty_max - params.low_penalty_min) * shortfall;
        1.0 - penalty
    }
}

/// Normalised ESG component for competitive scoring, in `[0, 1]`.
pub fn normalized_score(esg_score: f64, params: &EsgParams) -> f64 {
    (esg_score.max(0.0) / params.score_normalization).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> EsgParams {
        EsgParams::default()
    }

    #[test]
    fn test_high_tier_bonus() {
        let p = params();
        assert_eq!(revenue_multiplier(p.high_threshold, &p), 1.0 + p.high_bonus);
        assert_eq!(revenue_multiplier(900.0, &p), 1.0 + p.high_bonus);
    }

    #[test]
    fn test_mid_tier_bonus() {
        let p = params();
        assert_eq!(revenue_multiplier(p.mid_threshold, &p), 1.0 + p.mid_bonus);
        assert_eq!(revenue_multiplier(450.0, &p), 1.0 + p.mid_bonus);
    }

    #[test]
    fn test_low_tier_linear_penalty() {
        let p = params();
        // Just under the mid threshold: minimal penalty.
        let just_under = revenue_multiplier(p.mid_threshold - 1.0, &p);
        assert!((just_under - (1.0 - p.low_penalty_min)).abs() < 1e-9);
        // At zero: maximal penalty.
        let at_zero = revenue_multiplier(0.0, &p);
        assert!((at_zero - (1.0 - p.low_penalty_max)).abs() < 1e-9);
        // Monotone in between.
        assert!(revenue_multiplier(150.0, &p) > at_zero);
        assert!(revenue_multiplier(150.0, &p) < just_under);
    }

    #[test]
    fn test_normalized_score_clamps() {
        let p = params();
        assert_eq!(normalized_score(-50.0, &p), 0.0);
        assert_eq!(normalized_score(p.score_normalization * 2.0, &p), 1.0);
        assert!((normalized_score(500.0, &p) - 0.5).abs() < 1e-9);
    }
}
