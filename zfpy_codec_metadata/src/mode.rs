use derive_more::Display;

use crate::InvalidConfigError;

/// The `zfpy.mode_fixed_rate` mode code.
pub const MODE_FIXED_RATE: i32 = 2;

/// The `zfpy.mode_fixed_precision` mode code.
pub const MODE_FIXED_PRECISION: i32 = 3;

/// The `zfpy.mode_fixed_accuracy` mode code.
pub const MODE_FIXED_ACCURACY: i32 = 4;

/// A zfp compression mode supported by the `zfpy` codec.
///
/// The numeric codes match the `zfp_mode` enumeration exposed by the `zfpy` Python module.
/// The expert (`1`) and reversible (`5`) modes of zfp are not part of the `numcodecs.zfpy` codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum ZfpyMode {
    /// Fixed rate mode: a fixed number of compressed bits per value.
    #[display("fixed_rate")]
    FixedRate,
    /// Fixed precision mode: a fixed number of uncompressed bit planes per value.
    #[display("fixed_precision")]
    FixedPrecision,
    /// Fixed accuracy mode: an absolute error tolerance per value.
    #[display("fixed_accuracy")]
    FixedAccuracy,
}

impl ZfpyMode {
    /// Returns the `zfpy` mode code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::FixedRate => MODE_FIXED_RATE,
            Self::FixedPrecision => MODE_FIXED_PRECISION,
            Self::FixedAccuracy => MODE_FIXED_ACCURACY,
        }
    }

    /// Create a mode from a `zfpy` mode code.
    ///
    /// # Errors
    /// Returns an [`InvalidConfigError`] if `code` is not a supported mode.
    pub fn from_code(code: i32) -> Result<Self, InvalidConfigError> {
        match code {
            MODE_FIXED_RATE => Ok(Self::FixedRate),
            MODE_FIXED_PRECISION => Ok(Self::FixedPrecision),
            MODE_FIXED_ACCURACY => Ok(Self::FixedAccuracy),
            1 => Err(InvalidConfigError::new(
                "zfp expert mode (1) is not supported by the zfpy codec",
            )),
            5 => Err(InvalidConfigError::new(
                "zfp reversible mode (5) is not supported by the zfpy codec",
            )),
            _ => Err(InvalidConfigError::new(format!(
                "unrecognised zfpy mode {code}"
            ))),
        }
    }
}

impl TryFrom<i32> for ZfpyMode {
    type Error = InvalidConfigError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<ZfpyMode> for i32 {
    fn from(mode: ZfpyMode) -> Self {
        mode.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_codes() {
        for mode in [
            ZfpyMode::FixedRate,
            ZfpyMode::FixedPrecision,
            ZfpyMode::FixedAccuracy,
        ] {
            assert_eq!(ZfpyMode::from_code(mode.code()).unwrap(), mode);
        }
        assert_eq!(ZfpyMode::FixedAccuracy.code(), 4);
        assert_eq!(ZfpyMode::FixedAccuracy.to_string(), "fixed_accuracy");
    }

    #[test]
    fn mode_unrecognised() {
        for code in [-1, 0, 1, 5, 6, i32::MAX] {
            assert!(ZfpyMode::try_from(code).is_err());
        }
        assert_eq!(
            ZfpyMode::from_code(7).unwrap_err().reason(),
            "unrecognised zfpy mode 7"
        );
    }
}
