use std::fmt;

use crate::{InvalidConfigError, ZfpyMode};

/// The maximum number of bit planes zfp can encode per value.
pub const ZFP_MAX_PRECISION: u32 = 64;

/// The maximum number of compressed bits per value in fixed rate mode.
pub const ZFP_MAX_RATE: f64 = 64.0;

/// The compression parameter of the active [`ZfpyMode`].
///
/// Only the parameter relevant to the mode is carried.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZfpyParams {
    /// Fixed accuracy mode.
    FixedAccuracy {
        /// Absolute error tolerance.
        tolerance: f64,
    },
    /// Fixed rate mode.
    FixedRate {
        /// Compressed bits per value.
        rate: f64,
    },
    /// Fixed precision mode.
    FixedPrecision {
        /// Uncompressed bit planes per value.
        precision: u32,
    },
}

impl ZfpyParams {
    /// Returns the mode these parameters apply to.
    #[must_use]
    pub const fn mode(&self) -> ZfpyMode {
        match self {
            Self::FixedAccuracy { .. } => ZfpyMode::FixedAccuracy,
            Self::FixedRate { .. } => ZfpyMode::FixedRate,
            Self::FixedPrecision { .. } => ZfpyMode::FixedPrecision,
        }
    }

    /// Check that the parameter is usable by zfp.
    ///
    /// # Errors
    /// Returns an [`InvalidConfigError`] if
    ///  - a tolerance is negative or not finite,
    ///  - a rate is not between 0 and [`ZFP_MAX_RATE`], or
    ///  - a precision exceeds [`ZFP_MAX_PRECISION`].
    pub fn validate(self) -> Result<Self, InvalidConfigError> {
        match self {
            Self::FixedAccuracy { tolerance } if !(tolerance.is_finite() && tolerance >= 0.0) => {
                Err(InvalidConfigError::new(format!(
                    "tolerance must be a finite non-negative number, got {tolerance}"
                )))
            }
            Self::FixedRate { rate } if !(0.0..=ZFP_MAX_RATE).contains(&rate) => {
                Err(InvalidConfigError::new(format!(
                    "rate must be between 0 and {ZFP_MAX_RATE}, got {rate}"
                )))
            }
            Self::FixedPrecision { precision } if precision > ZFP_MAX_PRECISION => {
                Err(InvalidConfigError::new(format!(
                    "precision must be at most {ZFP_MAX_PRECISION}, got {precision}"
                )))
            }
            params => Ok(params),
        }
    }
}

impl fmt::Display for ZfpyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedAccuracy { tolerance } => write!(f, "tolerance={tolerance:?}"),
            Self::FixedRate { rate } => write!(f, "rate={rate:?}"),
            Self::FixedPrecision { precision } => write!(f, "precision={precision}"),
        }
    }
}

/// Resolve a `zfpy` mode code and its candidate parameters into [`ZfpyParams`].
///
/// Only the parameter matching `mode` is used.
/// `zfpy` marks unused parameters with a negative sentinel (`-1`), any other value for an unused parameter is ignored with a warning.
///
/// # Errors
/// Returns an [`InvalidConfigError`] if `mode` is not a supported mode code or the active parameter is invalid.
pub fn resolve(
    mode: i32,
    tolerance: f64,
    rate: f64,
    precision: i64,
) -> Result<ZfpyParams, InvalidConfigError> {
    let mode = ZfpyMode::from_code(mode)?;
    let params = match mode {
        ZfpyMode::FixedAccuracy => {
            warn_ignored(mode, &[("rate", rate >= 0.0), ("precision", precision >= 0)]);
            ZfpyParams::FixedAccuracy { tolerance }
        }
        ZfpyMode::FixedRate => {
            warn_ignored(
                mode,
                &[("tolerance", tolerance >= 0.0), ("precision", precision >= 0)],
            );
            ZfpyParams::FixedRate { rate }
        }
        ZfpyMode::FixedPrecision => {
            warn_ignored(mode, &[("tolerance", tolerance >= 0.0), ("rate", rate >= 0.0)]);
            let precision = u32::try_from(precision).map_err(|_| {
                InvalidConfigError::new(format!(
                    "precision must be between 0 and {ZFP_MAX_PRECISION}, got {precision}"
                ))
            })?;
            ZfpyParams::FixedPrecision { precision }
        }
    };
    params.validate()
}

fn warn_ignored(mode: ZfpyMode, parameters: &[(&str, bool)]) {
    let ignored: Vec<&str> = parameters
        .iter()
        .filter_map(|(name, is_set)| is_set.then_some(*name))
        .collect();
    if !ignored.is_empty() {
        log::warn!(
            "The zfpy {} parameter(s) are ignored in {mode} mode.",
            ignored.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MODE_FIXED_ACCURACY, MODE_FIXED_PRECISION, MODE_FIXED_RATE};

    #[test]
    fn resolve_fixed_accuracy() {
        assert_eq!(
            resolve(MODE_FIXED_ACCURACY, 1e-3, -1.0, -1).unwrap(),
            ZfpyParams::FixedAccuracy { tolerance: 1e-3 }
        );
    }

    #[test]
    fn resolve_fixed_rate() {
        assert_eq!(
            resolve(MODE_FIXED_RATE, -1.0, 10.5, -1).unwrap(),
            ZfpyParams::FixedRate { rate: 10.5 }
        );
    }

    #[test]
    fn resolve_fixed_precision() {
        assert_eq!(
            resolve(MODE_FIXED_PRECISION, -1.0, -1.0, 19).unwrap(),
            ZfpyParams::FixedPrecision { precision: 19 }
        );
    }

    #[test]
    fn resolve_ignores_inactive_parameters() {
        // Inactive parameters are never validated
        assert_eq!(
            resolve(MODE_FIXED_ACCURACY, 1e-3, f64::NAN, i64::MIN).unwrap(),
            ZfpyParams::FixedAccuracy { tolerance: 1e-3 }
        );
        assert_eq!(
            resolve(MODE_FIXED_RATE, f64::INFINITY, 4.0, 1000).unwrap(),
            ZfpyParams::FixedRate { rate: 4.0 }
        );
        assert_eq!(
            resolve(MODE_FIXED_PRECISION, -5.0, f64::NAN, 32).unwrap(),
            ZfpyParams::FixedPrecision { precision: 32 }
        );
    }

    #[test]
    fn resolve_invalid_mode() {
        assert!(resolve(0, 1e-3, 1e-3, 1).is_err());
        assert!(resolve(5, 1e-3, 1e-3, 1).is_err());
        assert!(resolve(42, 1e-3, 1e-3, 1).is_err());
    }

    #[test]
    fn resolve_invalid_active_parameter() {
        assert!(resolve(MODE_FIXED_ACCURACY, -1.0, 1.0, 1).is_err());
        assert!(resolve(MODE_FIXED_ACCURACY, f64::NAN, 1.0, 1).is_err());
        assert!(resolve(MODE_FIXED_RATE, 1.0, -1.0, 1).is_err());
        assert!(resolve(MODE_FIXED_RATE, 1.0, f64::INFINITY, 1).is_err());
        assert!(resolve(MODE_FIXED_RATE, 1.0, 64.5, 1).is_err());
        assert!(resolve(MODE_FIXED_RATE, 1.0, 1e12, 1).is_err());
        assert!(resolve(MODE_FIXED_RATE, 1.0, ZFP_MAX_RATE, 1).is_ok());
        assert!(resolve(MODE_FIXED_PRECISION, 1.0, 1.0, -1).is_err());
        assert!(resolve(MODE_FIXED_PRECISION, 1.0, 1.0, 65).is_err());
        assert!(resolve(MODE_FIXED_PRECISION, 1.0, 1.0, 64).is_ok());
    }

    #[test]
    fn resolve_warns_on_ignored_parameters() {
        testing_logger::setup();
        resolve(MODE_FIXED_ACCURACY, 1e-3, 8.0, 16).unwrap();
        testing_logger::validate(|captured_logs| {
            assert_eq!(captured_logs.len(), 1);
            assert_eq!(
                captured_logs[0].body,
                "The zfpy rate, precision parameter(s) are ignored in fixed_accuracy mode."
            );
            assert_eq!(captured_logs[0].level, log::Level::Warn);
        });
    }

    #[test]
    fn params_display() {
        assert_eq!(
            ZfpyParams::FixedAccuracy { tolerance: 0.001 }.to_string(),
            "tolerance=0.001"
        );
        assert_eq!(ZfpyParams::FixedRate { rate: 8.0 }.to_string(), "rate=8.0");
        assert_eq!(
            ZfpyParams::FixedPrecision { precision: 32 }.to_string(),
            "precision=32"
        );
    }
}
