use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Biometric record of the tracked user.
///
/// Immutable once built: updates go through [`Profile::with_photo`] and
/// [`Profile::with_physical_stats`], which produce a new value preserving
/// every field not explicitly changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    display_name: String,
    age_years: u32,
    is_male: bool,
    weight_kg: f64,
    height_cm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    photo_ref: Option<String>,
}

impl Profile {
    pub fn new(
        display_name: impl Into<String>,
        age_years: u32,
        is_male: bool,
        weight_kg: f64,
        height_cm: f64,
        photo_ref: Option<String>,
    ) -> Result<Self, SessionError> {
        if age_years == 0 {
            return Err(SessionError::InvalidProfile("age must be positive"));
        }
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(SessionError::InvalidProfile("weight must be positive"));
        }
        if !height_cm.is_finite() || height_cm <= 0.0 {
            return Err(SessionError::InvalidProfile("height must be positive"));
        }
        Ok(Self {
            display_name: display_name.into(),
            age_years,
            is_male,
            weight_kg,
            height_cm,
            photo_ref,
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn age_years(&self) -> u32 {
        self.age_years
    }

    pub fn is_male(&self) -> bool {
        self.is_male
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    pub fn photo_ref(&self) -> Option<&str> {
        self.photo_ref.as_deref()
    }

    /// Body mass index: weight over squared height in meters.
    pub fn body_mass_index(&self) -> f64 {
        let height_m = self.height_cm / 100.0;
        self.weight_kg / (height_m * height_m)
    }

    /// Copy of this profile with only the photo reference replaced.
    pub fn with_photo(&self, photo_ref: impl Into<String>) -> Self {
        Self {
            photo_ref: Some(photo_ref.into()),
            ..self.clone()
        }
    }

    /// Copy of this profile with only weight and height replaced.
    pub fn with_physical_stats(
        &self,
        weight_kg: f64,
        height_cm: f64,
    ) -> Result<Self, SessionError> {
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(SessionError::InvalidProfile("weight must be positive"));
        }
        if !height_cm.is_finite() || height_cm <= 0.0 {
            return Err(SessionError::InvalidProfile("height must be positive"));
        }
        Ok(Self {
            weight_kg,
            height_cm,
            ..self.clone()
        })
    }

    /// Display text for the profile screen, BMI rounded to two decimals.
    pub fn introduction(&self) -> String {
        let bmi = (self.body_mass_index() * 100.0).trunc() / 100.0;
        format!(
            "Hi, I'm {} and I'm {} years old. My BMI is {}.",
            self.display_name, self.age_years, bmi
        )
    }
}
