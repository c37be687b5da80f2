//! Fuzzy membership primitives
//!
//! Pure numeric functions used by every evaluator: the three curve shapes,
//! fuzzy AND/OR and weighted-average defuzzification. All degrees returned
//! lie in [0, 1].

use serde::Serialize;
use thiserror::Error;

use crate::models::TransportMode;

/// Invalid parameters for a membership curve, band table or weight set
///
/// These indicate a programming or configuration bug, never bad input data,
/// so they are reported at construction time and never clamped away.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{kind} membership parameters must be finite and non-decreasing, got {params:?}")]
    NonMonotonic { kind: &'static str, params: Vec<f64> },

    #[error("gaussian sigma must be positive, got {0}")]
    NonPositiveSigma(f64),

    #[error("gaussian center must be finite, got {0}")]
    NonFiniteCenter(f64),

    #[error("accessibility bands for {mode} must be positive and strictly increasing, got {bounds:?}")]
    NonIncreasingBands { mode: TransportMode, bounds: Vec<f64> },

    #[error("invalid {name} weight: {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// Triangular membership rising from `a` to a peak of 1.0 at `b`, falling to `c`
///
/// A zero-width side behaves as a step: the peak is returned at `x == b` even
/// when `a == b` or `b == c`.
#[inline]
pub fn triangular(x: f64, a: f64, b: f64, c: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    if x == b {
        return 1.0;
    }
    if x <= a || x >= c {
        return 0.0;
    }
    if x < b {
        (x - a) / (b - a)
    } else {
        (c - x) / (c - b)
    }
}

/// Trapezoidal membership: rise `a`→`b`, plateau of 1.0 on `[b, c]`, fall `c`→`d`
#[inline]
pub fn trapezoidal(x: f64, a: f64, b: f64, c: f64, d: f64) -> f64 {
    if x.is_nan() || x < a || x > d {
        return 0.0;
    }
    if x >= b && x <= c {
        return 1.0;
    }
    if x < b {
        (x - a) / (b - a)
    } else {
        (d - x) / (d - c)
    }
}

/// Gaussian membership `exp(-0.5 * ((x - center) / sigma)^2)`
pub fn gaussian(x: f64, center: f64, sigma: f64) -> Result<f64, ConfigurationError> {
    check_gaussian(center, sigma)?;
    Ok(gaussian_kernel(x, center, sigma))
}

#[inline]
pub(crate) fn gaussian_kernel(x: f64, center: f64, sigma: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    (-0.5 * ((x - center) / sigma).powi(2)).exp()
}

/// Fuzzy AND (minimum); 0.0 for empty input
pub fn fuzzy_and(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Fuzzy OR (maximum); 0.0 for empty input
pub fn fuzzy_or(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Weighted-average defuzzification `Σ(vᵢ·wᵢ) / Σwᵢ`
///
/// Returns 0.0 when the lengths differ, the input is empty or the weights
/// sum to zero. Never panics.
pub fn weighted_average(values: &[f64], weights: &[f64]) -> f64 {
    if values.is_empty() || values.len() != weights.len() {
        return 0.0;
    }

    let total: f64 = weights.iter().sum();
    if total.abs() <= f64::EPSILON || !total.is_finite() {
        return 0.0;
    }

    let weighted: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    weighted / total
}

fn check_ordered(kind: &'static str, params: &[f64]) -> Result<(), ConfigurationError> {
    let finite = params.iter().all(|p| p.is_finite());
    let ordered = params.windows(2).all(|w| w[0] <= w[1]);
    if finite && ordered {
        Ok(())
    } else {
        Err(ConfigurationError::NonMonotonic {
            kind,
            params: params.to_vec(),
        })
    }
}

fn check_gaussian(center: f64, sigma: f64) -> Result<(), ConfigurationError> {
    if !center.is_finite() {
        return Err(ConfigurationError::NonFiniteCenter(center));
    }
    if !(sigma > 0.0 && sigma.is_finite()) {
        return Err(ConfigurationError::NonPositiveSigma(sigma));
    }
    Ok(())
}

/// Curve parameters of a [`MembershipFunction`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Shape {
    Triangular { a: f64, b: f64, c: f64 },
    Trapezoidal { a: f64, b: f64, c: f64, d: f64 },
    Gaussian { center: f64, sigma: f64 },
}

/// Validated, immutable membership curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MembershipFunction {
    shape: Shape,
}

impl MembershipFunction {
    pub fn triangular(a: f64, b: f64, c: f64) -> Result<Self, ConfigurationError> {
        check_ordered("triangular", &[a, b, c])?;
        Ok(Self {
            shape: Shape::Triangular { a, b, c },
        })
    }

    pub fn trapezoidal(a: f64, b: f64, c: f64, d: f64) -> Result<Self, ConfigurationError> {
        check_ordered("trapezoidal", &[a, b, c, d])?;
        Ok(Self {
            shape: Shape::Trapezoidal { a, b, c, d },
        })
    }

    pub fn gaussian(center: f64, sigma: f64) -> Result<Self, ConfigurationError> {
        check_gaussian(center, sigma)?;
        Ok(Self {
            shape: Shape::Gaussian { center, sigma },
        })
    }

    /// Wrap a shape whose parameters are already known to be valid
    pub(crate) const fn from_trusted(shape: Shape) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Degree of membership of `x`, in [0, 1]
    #[inline]
    pub fn evaluate(&self, x: f64) -> f64 {
        match self.shape {
            Shape::Triangular { a, b, c } => triangular(x, a, b, c),
            Shape::Trapezoidal { a, b, c, d } => trapezoidal(x, a, b, c, d),
            Shape::Gaussian { center, sigma } => gaussian_kernel(x, center, sigma),
        }
    }
}
