use crate::profile::Profile;

/// Fixed light-activity multiplier applied on top of the resting estimate.
pub const LIGHT_ACTIVITY_FACTOR: f64 = 1.375;

/// Daily caloric budget estimation.
///
/// Callers depend on this contract only, so the formula can be swapped
/// without touching the session manager. Implementations are pure and
/// deterministic.
pub trait BudgetStrategy: Send + Sync {
    fn daily_budget(&self, profile: &Profile) -> u32;
}

/// Mifflin-St Jeor resting-energy estimator, the default strategy.
#[derive(Debug, Clone)]
pub struct MifflinStJeor {
    activity_factor: f64,
}

impl MifflinStJeor {
    pub fn new(activity_factor: f64) -> Self {
        Self { activity_factor }
    }
}

impl Default for MifflinStJeor {
    fn default() -> Self {
        Self::new(LIGHT_ACTIVITY_FACTOR)
    }
}

impl BudgetStrategy for MifflinStJeor {
    fn daily_budget(&self, profile: &Profile) -> u32 {
        let sex_term = if profile.is_male() { 5.0 } else { -161.0 };
        let bmr = 10.0 * profile.weight_kg() + 6.25 * profile.height_cm()
            - 5.0 * f64::from(profile.age_years())
            + sex_term;
        clamp_kcal(bmr * self.activity_factor)
    }
}

/// Harris-Benedict (revised) estimator, the alternative formula the
/// strategy seam exists for.
#[derive(Debug, Clone)]
pub struct HarrisBenedict {
    activity_factor: f64,
}

impl HarrisBenedict {
    pub fn new(activity_factor: f64) -> Self {
        Self { activity_factor }
    }
}

impl Default for HarrisBenedict {
    fn default() -> Self {
        Self::new(LIGHT_ACTIVITY_FACTOR)
    }
}

impl BudgetStrategy for HarrisBenedict {
    fn daily_budget(&self, profile: &Profile) -> u32 {
        let w = profile.weight_kg();
        let h = profile.height_cm();
        let a = f64::from(profile.age_years());
        let bmr = if profile.is_male() {
            88.362 + 13.397 * w + 4.799 * h - 5.677 * a
        } else {
            447.593 + 9.247 * w + 3.098 * h - 4.330 * a
        };
        clamp_kcal(bmr * self.activity_factor)
    }
}

fn clamp_kcal(total: f64) -> u32 {
    if !total.is_finite() || total <= 0.0 {
        return 0;
    }
    total.floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn male_reference() -> Profile {
        Profile::new("Ref", 30, true, 70.0, 175.0, None).expect("valid profile")
    }

    #[test]
    fn mifflin_male_reference_value() {
        // BMR = 700 + 1093.75 - 150 + 5 = 1648.75; floor(1648.75 * 1.375) = 2267
        let budget = MifflinStJeor::default().daily_budget(&male_reference());
        assert_eq!(budget, 2267);
    }

    #[test]
    fn mifflin_female_reference_value() {
        // BMR = 600 + 1031.25 - 125 - 161 = 1345.25; floor(1345.25 * 1.375) = 1849
        let p = Profile::new("Ref", 25, false, 60.0, 165.0, None).expect("valid profile");
        assert_eq!(MifflinStJeor::default().daily_budget(&p), 1849);
    }

    #[test]
    fn budget_is_deterministic() {
        let p = male_reference();
        let strategy = MifflinStJeor::default();
        assert_eq!(strategy.daily_budget(&p), strategy.daily_budget(&p));
    }

    #[test]
    fn negative_estimates_clamp_to_zero() {
        // A profile small and old enough to push the linear formula negative.
        let p = Profile::new("Edge", 120, false, 0.5, 1.0, None).expect("valid profile");
        assert_eq!(MifflinStJeor::default().daily_budget(&p), 0);
    }

    #[test]
    fn harris_benedict_differs_but_stays_positive() {
        let p = male_reference();
        // BMR = 88.362 + 937.79 + 839.825 - 170.31 = 1695.667
        let budget = HarrisBenedict::default().daily_budget(&p);
        assert_eq!(budget, 2331);
        assert_ne!(budget, MifflinStJeor::default().daily_budget(&p));
    }

    #[test]
    fn custom_activity_factor_scales_budget() {
        let p = male_reference();
        let sedentary = MifflinStJeor::new(1.2).daily_budget(&p);
        let light = MifflinStJeor::default().daily_budget(&p);
        assert!(sedentary < light);
    }
}
