//! Exponential decay weighting

use crate::mention::ContentKind;

/// Weight model `base_weight(kind) * exp(-lambda * age)` with `lambda = ln 2 / H`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayModel {
    lambda: f64,
}

impl DecayModel {
    /// `half_life_secs` must be positive and finite (checked by config validation)
    pub fn new(half_life_secs: f64) -> Self {
        Self {
            lambda: std::f64::consts::LN_2 / half_life_secs,
        }
    }

    /// Decayed weight of one mention
    ///
    /// Negative ages (records stamped slightly in the future) count as
    /// age zero, so a record never weighs more than its base weight.
    pub fn weight(&self, kind: ContentKind, age_secs: f64) -> f64 {
        let age_secs = age_secs.max(0.0);
        kind.base_weight() * (-self.lambda * age_secs).exp()
    }
}
