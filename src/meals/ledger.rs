//! Derived, recomputed-on-demand views over the meal ledger.

use std::collections::HashMap;

use crate::meals::MealEntry;

/// Classification of one calendar date's intake against the daily budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    /// Total intake within budget.
    Met,
    /// Total intake strictly above budget.
    Exceeded,
    /// No entries recorded for the date.
    Empty,
}

/// Group meals by date and classify each date against `budget`.
///
/// Dates with no entries are absent from the map; callers treat absence as
/// [`DayStatus::Empty`] (see [`status_for_date`]). With a zero budget no
/// classification is meaningful and the result is empty.
pub fn day_status_map(meals: &[MealEntry], budget: u32) -> HashMap<String, DayStatus> {
    if budget == 0 {
        return HashMap::new();
    }
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for meal in meals {
        *totals.entry(meal.date.as_str()).or_default() += u64::from(meal.calories_kcal);
    }
    totals
        .into_iter()
        .map(|(date, total)| {
            let status = if total > u64::from(budget) {
                DayStatus::Exceeded
            } else {
                DayStatus::Met
            };
            (date.to_owned(), status)
        })
        .collect()
}

/// Sum of calories recorded for one calendar date.
pub fn total_for_date(meals: &[MealEntry], date: &str) -> u64 {
    meals
        .iter()
        .filter(|m| m.date == date)
        .map(|m| u64::from(m.calories_kcal))
        .sum()
}

/// Status for a single date, defaulting unlisted dates to [`DayStatus::Empty`].
pub fn status_for_date(map: &HashMap<String, DayStatus>, date: &str) -> DayStatus {
    map.get(date).copied().unwrap_or(DayStatus::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal(date: &str, kcal: u32) -> MealEntry {
        MealEntry {
            name: "test".into(),
            calories_kcal: kcal,
            protein_g: 0,
            carbs_g: 0,
            fat_g: 0,
            date: date.into(),
            source_description: None,
        }
    }

    #[test]
    fn zero_budget_yields_empty_map() {
        let meals = vec![meal("2024-01-01", 1500), meal("2024-01-02", 100)];
        assert!(day_status_map(&meals, 0).is_empty());
    }

    #[test]
    fn sums_per_date_and_classifies_strictly_above_budget() {
        // 1500 + 600 = 2100 > 2000 on the first date, 2000 == 2000 on the second.
        let meals = vec![
            meal("2024-01-01", 1500),
            meal("2024-01-01", 600),
            meal("2024-01-02", 2000),
        ];
        let map = day_status_map(&meals, 2000);
        assert_eq!(map.len(), 2);
        assert_eq!(map["2024-01-01"], DayStatus::Exceeded);
        assert_eq!(map["2024-01-02"], DayStatus::Met);
    }

    #[test]
    fn dates_without_entries_are_absent_and_default_to_empty() {
        let meals = vec![meal("2024-01-01", 300)];
        let map = day_status_map(&meals, 2000);
        assert!(!map.contains_key("2024-01-02"));
        assert_eq!(status_for_date(&map, "2024-01-02"), DayStatus::Empty);
        assert_eq!(status_for_date(&map, "2024-01-01"), DayStatus::Met);
    }

    #[test]
    fn total_for_date_ignores_other_dates() {
        let meals = vec![
            meal("2024-03-01", 400),
            meal("2024-03-02", 700),
            meal("2024-03-01", 250),
        ];
        assert_eq!(total_for_date(&meals, "2024-03-01"), 650);
        assert_eq!(total_for_date(&meals, "2024-03-03"), 0);
    }

    #[test]
    fn large_sums_do_not_overflow() {
        let meals = vec![meal("2024-01-01", u32::MAX), meal("2024-01-01", u32::MAX)];
        let map = day_status_map(&meals, 2000);
        assert_eq!(map["2024-01-01"], DayStatus::Exceeded);
    }
}
