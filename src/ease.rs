/// Easing curves used by the procedural animation states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    Linear,
    /// Hermite smoothstep `3t^2 - 2t^3`; drives the clear-quad growth.
    SmoothStep,
    /// Half-sine pulse over a smoothstepped argument: rises from zero and
    /// falls back to zero, smooth at both ends. Drives move displacement.
    SinePulse,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
            Self::SinePulse => (Self::SmoothStep.apply(t) * std::f64::consts::PI).sin(),
        }
    }
}
