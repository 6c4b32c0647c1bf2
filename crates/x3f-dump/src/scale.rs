//! Gamma/min/max rescaling of 16-bit samples

use x3f_core::{X3fError, X3fResult};

/// Options for scaled image output
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScaleOptions {
    /// Output gamma; `None` writes samples unchanged
    pub gamma: Option<f64>,
    /// Lower bound, defaults to the smallest sample
    pub min: Option<u16>,
    /// Upper bound, defaults to the largest sample
    pub max: Option<u16>,
}

impl ScaleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn min(mut self, min: u16) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: u16) -> Self {
        self.max = Some(max);
        self
    }

    pub fn is_scaled(&self) -> bool {
        self.gamma.is_some()
    }

    pub fn validate(&self) -> X3fResult<()> {
        match self.gamma {
            None if self.min.is_some() || self.max.is_some() => Err(X3fError::InvalidParameter(
                "min and max need a gamma".to_string(),
            )),
            Some(gamma) if !(gamma.is_finite() && gamma > 0.0) => Err(
                X3fError::InvalidParameter(format!("gamma must be positive, got {}", gamma)),
            ),
            _ => match (self.min, self.max) {
                (Some(min), Some(max)) if min >= max => Err(X3fError::InvalidParameter(format!(
                    "min {} must be below max {}",
                    min, max
                ))),
                _ => Ok(()),
            },
        }
    }
}

/// Smallest and largest sample, `None` for an empty slice
pub fn extrema(samples: &[u16]) -> Option<(u16, u16)> {
    samples.iter().fold(None, |acc, &s| match acc {
        None => Some((s, s)),
        Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
    })
}

/// Maps `[min, max]` onto `[0, 65535]` through `x^(1/gamma)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rescaler {
    min: u16,
    max: u16,
    inv_gamma: f64,
}

impl Rescaler {
    pub fn new(min: u16, max: u16, gamma: f64) -> X3fResult<Self> {
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(X3fError::InvalidParameter(format!(
                "gamma must be positive, got {}",
                gamma
            )));
        }
        if min > max {
            return Err(X3fError::InvalidParameter(format!(
                "min {} above max {}",
                min, max
            )));
        }
        Ok(Self {
            min,
            max,
            inv_gamma: 1.0 / gamma,
        })
    }

    /// Rescaler for `samples`, filling unset bounds from their extrema; `None`
    /// when no gamma is requested
    pub fn for_samples(options: &ScaleOptions, samples: &[u16]) -> X3fResult<Option<Self>> {
        options.validate()?;
        let Some(gamma) = options.gamma else {
            return Ok(None);
        };
        let (lo, hi) = extrema(samples).unwrap_or((0, u16::MAX));
        Self::new(options.min.unwrap_or(lo), options.max.unwrap_or(hi), gamma).map(Some)
    }

    pub fn bounds(&self) -> (u16, u16) {
        (self.min, self.max)
    }

    pub fn apply(&self, sample: u16) -> u16 {
        if self.max == self.min {
            return if sample <= self.min { 0 } else { u16::MAX };
        }
        let clamped = sample.clamp(self.min, self.max);
        let t = (clamped - self.min) as f64 / (self.max - self.min) as f64;
        (u16::MAX as f64 * t.powf(self.inv_gamma)).round() as u16
    }
}

/// Apply `options` to every sample; samples pass through untouched without a gamma
pub fn rescale(samples: &[u16], options: &ScaleOptions) -> X3fResult<Vec<u16>> {
    match Rescaler::for_samples(options, samples)? {
        Some(rescaler) => Ok(samples.iter().map(|&s| rescaler.apply(s)).collect()),
        None => Ok(samples.to_vec()),
    }
}
