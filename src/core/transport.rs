use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::membership::{gaussian_kernel, triangular, ConfigurationError};
use crate::models::{AccessibilityBand, TransportMode};

/// Offset of the very-far gaussian peak past the start of its band, in metres
const VERY_FAR_PEAK_OFFSET_M: f64 = 1000.0;
/// Spread of the very-far gaussian, in metres
const VERY_FAR_SIGMA_M: f64 = 2000.0;

impl TransportMode {
    /// Average travel cost in minutes per kilometre
    pub fn minutes_per_km(self) -> f64 {
        match self {
            TransportMode::Walk => 12.0,
            TransportMode::Bike => 4.0,
            TransportMode::Bus => 6.0,
            TransportMode::Car => 2.0,
        }
    }

    /// Upper bounds (metres) of the very_close, close, moderate and far bands
    pub fn default_band_bounds(self) -> [f64; 4] {
        match self {
            TransportMode::Walk => [200.0, 500.0, 1000.0, 2000.0],
            TransportMode::Bike => [500.0, 1500.0, 3000.0, 5000.0],
            TransportMode::Bus => [300.0, 800.0, 1500.0, 3000.0],
            TransportMode::Car => [1000.0, 3000.0, 8000.0, 15000.0],
        }
    }

    fn index(self) -> usize {
        match self {
            TransportMode::Walk => 0,
            TransportMode::Bike => 1,
            TransportMode::Bus => 2,
            TransportMode::Car => 3,
        }
    }
}

/// Five contiguous distance bands for one transport mode
///
/// The first band starts at 0 m and the last is unbounded; only the four
/// inner boundaries are stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeBands {
    mode: TransportMode,
    upper: [f64; 4],
}

impl ModeBands {
    pub fn new(mode: TransportMode, upper: [f64; 4]) -> Result<Self, ConfigurationError> {
        let positive = upper.iter().all(|b| b.is_finite() && *b > 0.0);
        let increasing = upper.windows(2).all(|w| w[0] < w[1]);
        if !(positive && increasing) {
            return Err(ConfigurationError::NonIncreasingBands {
                mode,
                bounds: upper.to_vec(),
            });
        }
        Ok(Self { mode, upper })
    }

    fn builtin(mode: TransportMode) -> Self {
        Self {
            mode,
            upper: mode.default_band_bounds(),
        }
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Metre interval of a band; the very-far band ends at infinity
    pub fn interval(&self, band: AccessibilityBand) -> (f64, f64) {
        let u = &self.upper;
        match band {
            AccessibilityBand::VeryClose => (0.0, u[0]),
            AccessibilityBand::Close => (u[0], u[1]),
            AccessibilityBand::Moderate => (u[1], u[2]),
            AccessibilityBand::Far => (u[2], u[3]),
            AccessibilityBand::VeryFar => (u[3], f64::INFINITY),
        }
    }

    /// First band whose upper bound is at least `distance_m`
    pub fn classify(&self, distance_m: f64) -> AccessibilityBand {
        AccessibilityBand::ALL
            .into_iter()
            .find(|band| distance_m <= self.interval(*band).1)
            .unwrap_or(AccessibilityBand::VeryFar)
    }

    /// Smooth per-band degrees: a triangle peaking at each finite band's
    /// midpoint, and a gaussian for the very-far band
    pub fn memberships(&self, distance_m: f64) -> BTreeMap<AccessibilityBand, f64> {
        AccessibilityBand::ALL
            .into_iter()
            .map(|band| {
                let (lower, upper) = self.interval(band);
                let degree = match band {
                    AccessibilityBand::VeryFar => gaussian_kernel(
                        distance_m,
                        lower + VERY_FAR_PEAK_OFFSET_M,
                        VERY_FAR_SIGMA_M,
                    ),
                    _ => triangular(distance_m, lower, lower + (upper - lower) / 2.0, upper),
                };
                (band, degree)
            })
            .collect()
    }
}

/// Accessibility of one distance under one transport mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityEvaluation {
    pub mode: TransportMode,
    pub distance_m: f64,
    pub distance_km: f64,
    pub classification: AccessibilityBand,
    pub accessibility_score: f64,
    pub time_minutes: f64,
    pub memberships: BTreeMap<AccessibilityBand, f64>,
}

/// Classifies distances into accessibility bands per transport mode
#[derive(Debug, Clone, PartialEq)]
pub struct TransportAccessibilityEvaluator {
    bands: [ModeBands; 4],
}

impl TransportAccessibilityEvaluator {
    pub fn new() -> Self {
        Self {
            bands: TransportMode::ALL.map(ModeBands::builtin),
        }
    }

    /// Build an evaluator with custom band tables; modes not listed keep
    /// their default bands
    pub fn with_bands(
        custom: impl IntoIterator<Item = ModeBands>,
    ) -> Self {
        let mut evaluator = Self::new();
        for bands in custom {
            evaluator.bands[bands.mode().index()] = bands;
        }
        evaluator
    }

    pub fn bands(&self, mode: TransportMode) -> &ModeBands {
        &self.bands[mode.index()]
    }

    /// Evaluate a distance in metres under `mode`
    ///
    /// Negative distances count as zero; non-finite distances as unreachable.
    pub fn evaluate(&self, distance_m: f64, mode: TransportMode) -> AccessibilityEvaluation {
        let distance_m = if distance_m.is_finite() {
            distance_m.max(0.0)
        } else {
            f64::INFINITY
        };

        let bands = self.bands(mode);
        let classification = bands.classify(distance_m);
        let distance_km = distance_m / 1000.0;

        AccessibilityEvaluation {
            mode,
            distance_m,
            distance_km: round_to(distance_km, 2),
            classification,
            accessibility_score: classification.step_score(),
            time_minutes: round_to(distance_km * mode.minutes_per_km(), 1),
            memberships: bands.memberships(distance_m),
        }
    }

    /// Evaluate the same distance under several modes, best first
    ///
    /// Ties keep the order the modes were given in.
    pub fn compare_modes(
        &self,
        distance_m: f64,
        modes: &[TransportMode],
    ) -> Vec<AccessibilityEvaluation> {
        let mut evaluations: Vec<AccessibilityEvaluation> = modes
            .iter()
            .map(|mode| self.evaluate(distance_m, *mode))
            .collect();

        // sort_by is stable
        evaluations.sort_by(|a, b| b.accessibility_score.total_cmp(&a.accessibility_score));
        evaluations
    }
}

impl Default for TransportAccessibilityEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
