use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub mod ledger;

/// A recorded meal, produced once by the recognition step or manually.
/// Never edited afterwards: the ledger only appends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealEntry {
    pub name: String,
    pub calories_kcal: u32,
    pub protein_g: u32,
    pub carbs_g: u32,
    pub fat_g: u32,
    /// Calendar date of consumption, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_description: Option<String>,
}

impl MealEntry {
    /// All-zero entry, the normalized shape for photos that are not food.
    pub fn zero(name: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calories_kcal: 0,
            protein_g: 0,
            carbs_g: 0,
            fat_g: 0,
            date: date.into(),
            source_description: None,
        }
    }

    /// True when every estimated value is zero (non-food or failed parse).
    pub fn is_empty_estimate(&self) -> bool {
        self.calories_kcal == 0 && self.protein_g == 0 && self.carbs_g == 0 && self.fat_g == 0
    }
}

/// Today's UTC calendar date in the ledger's `YYYY-MM-DD` format.
pub fn today_utc() -> String {
    let d = OffsetDateTime::now_utc().date();
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_entry_is_empty_estimate() {
        let e = MealEntry::zero("Not food", "2024-01-01");
        assert!(e.is_empty_estimate());
        assert_eq!(e.date, "2024-01-01");
    }

    #[test]
    fn non_zero_macros_are_not_empty() {
        let mut e = MealEntry::zero("Salad", "2024-01-01");
        e.protein_g = 3;
        assert!(!e.is_empty_estimate());
    }

    #[test]
    fn today_utc_is_iso_calendar_date() {
        let today = today_utc();
        assert_eq!(today.len(), 10);
        let parts: Vec<&str> = today.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 2);
        assert_eq!(parts[2].len(), 2);
    }

    #[test]
    fn serde_omits_absent_description() {
        let e = MealEntry::zero("Soup", "2024-02-02");
        let json = serde_json::to_string(&e).expect("serialize");
        assert!(!json.contains("source_description"));

        let with = MealEntry {
            source_description: Some("lentil soup".into()),
            ..e
        };
        let json = serde_json::to_string(&with).expect("serialize");
        let back: MealEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.source_description.as_deref(), Some("lentil soup"));
    }
}
