use crate::algebra::*;
use derive_builder::Builder;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Error type returned by settings validation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    /// An error attributable to one of the fields
    #[error("Bad value for field \"{0}\"")]
    BadFieldValue(&'static str),
}

/// Settings for the dual active set engine and its projection driver

#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DasaSettings<T: FloatT> {
    ///proximal regularization, also the floor on the factor diagonal
    #[builder(default = "(1e-8).as_T()")]
    pub sigma: T,

    ///scale sigma by the largest |a_ij|
    #[builder(default = "true")]
    pub scale_sigma: bool,

    ///maximum scheduler sweeps in one engine run
    #[builder(default = "1000")]
    pub max_sweeps: u32,

    ///maximum outer rounds of the projection driver
    #[builder(default = "100")]
    pub max_outer_iter: u32,

    ///absolute tolerance on constraint row residuals
    #[builder(default = "(1e-9).as_T()")]
    pub tol_feas: T,

    ///use coordinate ascent when coorcost*nnz(A) is below the flops per update
    #[builder(default = "(0.125).as_T()")]
    pub coorcost: T,

    ///use SSOR sweeps when ssorcost*nnz(A) is below the flops per update
    #[builder(default = "(0.5).as_T()")]
    pub ssorcost: T,

    ///consult the cheap inner method heuristic in the driver
    #[builder(default = "true")]
    pub use_cheap_inner_method: bool,

    ///verbose printing
    #[builder(default = "false")]
    pub verbose: bool,

    ///detail of verbose printing (0 = summary, 1 = per run, 2 = per sweep)
    #[builder(default = "1")]
    pub print_level: u32,
}

impl<T> Default for DasaSettings<T>
where
    T: FloatT,
{
    fn default() -> DasaSettings<T> {
        DasaSettingsBuilder::<T>::default().build().unwrap()
    }
}

impl<T> DasaSettings<T>
where
    T: FloatT,
{
    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_positive(self.sigma, "sigma")?;
        validate_positive(self.tol_feas, "tol_feas")?;
        validate_nonnegative(self.coorcost, "coorcost")?;
        validate_nonnegative(self.ssorcost, "ssorcost")?;
        if self.max_sweeps == 0 {
            return Err(SettingsError::BadFieldValue("max_sweeps"));
        }
        if self.max_outer_iter == 0 {
            return Err(SettingsError::BadFieldValue("max_outer_iter"));
        }
        Ok(())
    }
}

fn validate_positive<T: FloatT>(v: T, field: &'static str) -> Result<(), SettingsError> {
    if v.is_finite() && v > T::zero() {
        Ok(())
    } else {
        Err(SettingsError::BadFieldValue(field))
    }
}

fn validate_nonnegative<T: FloatT>(v: T, field: &'static str) -> Result<(), SettingsError> {
    if v.is_finite() && v >= T::zero() {
        Ok(())
    } else {
        Err(SettingsError::BadFieldValue(field))
    }
}

// pre build checker (for auto-validation when using the builder)

impl From<SettingsError> for DasaSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        DasaSettingsBuilderError::ValidationError(e.to_string())
    }
}

impl<T> DasaSettingsBuilder<T>
where
    T: FloatT,
{
    /// check that the settings are valid before building
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(sigma) = self.sigma {
            validate_positive(sigma, "sigma")?;
        }
        if let Some(tol) = self.tol_feas {
            validate_positive(tol, "tol_feas")?;
        }
        if let Some(c) = self.coorcost {
            validate_nonnegative(c, "coorcost")?;
        }
        if let Some(c) = self.ssorcost {
            validate_nonnegative(c, "ssorcost")?;
        }
        if self.max_sweeps == Some(0) {
            return Err(SettingsError::BadFieldValue("max_sweeps"));
        }
        if self.max_outer_iter == Some(0) {
            return Err(SettingsError::BadFieldValue("max_outer_iter"));
        }
        Ok(())
    }
}

#[test]
fn test_settings_validate() {
    // all standard settings
    DasaSettings::<f64>::default().validate().unwrap();

    // fail on a non-positive regularization
    let settings = DasaSettingsBuilder::<f64>::default().sigma(0.).build();
    assert!(settings.is_err());

    let settings = DasaSettingsBuilder::<f64>::default()
        .tol_feas(f64::NAN)
        .build();
    assert!(settings.is_err());

    let settings = DasaSettingsBuilder::<f64>::default().max_sweeps(0).build();
    assert!(settings.is_err());

    // a direct edit is only caught by validate()
    let mut settings = DasaSettings::<f64>::default();
    settings.coorcost = -1.;
    assert_eq!(
        settings.validate(),
        Err(SettingsError::BadFieldValue("coorcost"))
    );
}

#[cfg(feature = "serde")]
#[test]
fn test_settings_serde() {
    let settings = DasaSettingsBuilder::<f64>::default()
        .sigma(1e-6)
        .max_sweeps(17)
        .build()
        .unwrap();
    let text = serde_json::to_string(&settings).unwrap();
    let back: DasaSettings<f64> = serde_json::from_str(&text).unwrap();
    assert_eq!(back.sigma, 1e-6);
    assert_eq!(back.max_sweeps, 17);

    // missing fields take their defaults
    let partial: DasaSettings<f64> = serde_json::from_str("{\"verbose\": true}").unwrap();
    assert!(partial.verbose);
    assert_eq!(partial.max_outer_iter, 100);
}
