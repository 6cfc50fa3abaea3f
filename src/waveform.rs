//! Mapping of an arbitrary signal, given in volts, onto edit memory sample codes.

use crate::{Error, Result};

/// Value range covered by a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub fn of(signal: &[f64]) -> Result<Span> {
        if signal.is_empty() {
            return Err(Error::InvalidArgument("arbitrary signal is empty".to_owned()))
        }
        if let Some(index) = signal.iter().position(|value| !value.is_finite()) {
            return Err(Error::InvalidArgument(
                format!("arbitrary signal sample {} is {}", index, signal[index])))
        }
        let min = signal.iter().copied().fold(f64::INFINITY, f64::min);
        let max = signal.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Span { min, max })
    }

    /// Peak-to-peak amplitude.
    pub fn amplitude(&self) -> f64 {
        self.max - self.min
    }

    /// Midpoint between the extremes.
    pub fn offset(&self) -> f64 {
        (self.max + self.min) / 2.0
    }

    /// Scale `signal` so that `min` maps to code 0 and `max` maps to `max_code`, rounding to
    /// the nearest code. A flat signal maps to the middle code.
    pub fn to_codes(&self, signal: &[f64], max_code: i16) -> Vec<i16> {
        let amplitude = self.amplitude();
        signal.iter()
            .map(|&value| {
                if amplitude == 0.0 {
                    max_code / 2
                } else {
                    let code = (value - self.min) / amplitude * max_code as f64;
                    code.round().clamp(0.0, max_code as f64) as i16
                }
            })
            .collect()
    }
}
