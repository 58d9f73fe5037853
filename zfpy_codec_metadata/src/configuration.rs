use derive_more::Display;
use monostate::MustBe;
use serde::{Deserialize, Serialize};

use crate::{InvalidConfigError, MODE_FIXED_ACCURACY, ZfpyParams, resolve};

/// `zfpy` codec configuration parameters (`numcodecs.zfpy`).
///
/// Unused parameters hold the `-1` sentinel used by `numcodecs`.
/// They are retained as given so that [`to_json`](ZfpyCodecConfiguration::to_json) reproduces the source metadata.
/// Unknown fields, such as the `compression_kwargs` written by older `numcodecs` releases, are ignored.
///
/// ### Example
/// ```json
/// {
///     "id": "zfpy",
///     "mode": 4,
///     "tolerance": 0.05,
///     "rate": -1,
///     "precision": -1
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ZfpyCodecConfiguration {
    /// The `zfpy` mode code.
    #[serde(default = "mode_default")]
    pub mode: i32,
    /// The absolute error tolerance (fixed accuracy mode).
    #[serde(default = "unset_f64")]
    pub tolerance: f64,
    /// The compressed bits per value (fixed rate mode).
    #[serde(default = "unset_f64")]
    pub rate: f64,
    /// The uncompressed bit planes per value (fixed precision mode).
    #[serde(default = "unset_i64")]
    pub precision: i64,
}

/// The `numcodecs` codec metadata: the codec `id` alongside its configuration.
#[derive(Serialize, Deserialize)]
struct ZfpyCodecMetadata {
    #[serde(default)]
    id: MustBe!("zfpy"),
    #[serde(flatten)]
    configuration: ZfpyCodecConfiguration,
}

const fn mode_default() -> i32 {
    MODE_FIXED_ACCURACY
}

const fn unset_f64() -> f64 {
    -1.0
}

const fn unset_i64() -> i64 {
    -1
}

impl ZfpyCodecConfiguration {
    /// Create a configuration holding `params` with unused parameters unset.
    #[must_use]
    pub fn new(params: ZfpyParams) -> Self {
        let mut configuration = Self {
            mode: params.mode().code(),
            tolerance: unset_f64(),
            rate: unset_f64(),
            precision: unset_i64(),
        };
        match params {
            ZfpyParams::FixedAccuracy { tolerance } => configuration.tolerance = tolerance,
            ZfpyParams::FixedRate { rate } => configuration.rate = rate,
            ZfpyParams::FixedPrecision { precision } => {
                configuration.precision = i64::from(precision);
            }
        }
        configuration
    }

    /// Resolve the parameters of the configured mode.
    ///
    /// # Errors
    /// Returns an [`InvalidConfigError`] if the mode is unrecognised or its parameter is invalid.
    pub fn params(&self) -> Result<ZfpyParams, InvalidConfigError> {
        resolve(self.mode, self.tolerance, self.rate, self.precision)
    }

    /// Parse `numcodecs` JSON codec metadata.
    ///
    /// The `id` field is optional, but must be `"zfpy"` if present.
    /// The parameters are not validated, see [`params`](ZfpyCodecConfiguration::params).
    ///
    /// # Errors
    /// Returns an [`InvalidConfigError`] if `json` is not `zfpy` codec metadata.
    pub fn from_json(json: &str) -> Result<Self, InvalidConfigError> {
        serde_json::from_str::<ZfpyCodecMetadata>(json)
            .map(|metadata| metadata.configuration)
            .map_err(|err| InvalidConfigError::new(err.to_string()))
    }

    /// Serialise to `numcodecs` JSON codec metadata, including the codec `id`.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(&ZfpyCodecMetadata {
            id: Default::default(),
            configuration: *self,
        })
        .unwrap_or_default()
    }
}

impl From<ZfpyParams> for ZfpyCodecConfiguration {
    fn from(params: ZfpyParams) -> Self {
        Self::new(params)
    }
}
