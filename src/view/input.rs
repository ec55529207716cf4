use thiserror::Error;

use crate::domain::{Entry, EntryKind};

/// Reasons a form submission is refused before it reaches the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Please enter a name")]
    MissingName,
    #[error("Please enter the calories")]
    MissingCalories,
    #[error("`{0}` is not a number")]
    NotANumber(String),
    #[error("Please enter a limit")]
    MissingLimit,
}

/// Builds a fresh entry from raw form fields.
pub fn parse_entry(name: &str, calories: &str, kind: EntryKind) -> Result<Entry, InputError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(InputError::MissingName);
    }
    if calories.trim().is_empty() {
        return Err(InputError::MissingCalories);
    }
    let calories = parse_calories(calories)?;
    Ok(Entry::new(name, calories, kind))
}

pub fn parse_limit(raw: &str) -> Result<f64, InputError> {
    if raw.trim().is_empty() {
        return Err(InputError::MissingLimit);
    }
    parse_calories(raw)
}

/// Accepts any finite number, including negatives.
pub fn parse_calories(raw: &str) -> Result<f64, InputError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| InputError::NotANumber(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NamedEntity;

    #[test]
    fn valid_fields_build_an_entry() {
        let entry = parse_entry("  Porridge ", "320", EntryKind::Meal).unwrap();
        assert_eq!(entry.name(), "Porridge");
        assert_eq!(entry.calories(), 320.0);
        assert_eq!(entry.kind(), EntryKind::Meal);
    }

    #[test]
    fn empty_fields_are_refused() {
        assert_eq!(
            parse_entry("", "100", EntryKind::Meal),
            Err(InputError::MissingName)
        );
        assert_eq!(
            parse_entry("Run", " ", EntryKind::Workout),
            Err(InputError::MissingCalories)
        );
        assert_eq!(parse_limit(""), Err(InputError::MissingLimit));
    }

    #[test]
    fn non_numbers_are_refused() {
        assert_eq!(
            parse_calories("lots"),
            Err(InputError::NotANumber("lots".into()))
        );
        assert!(parse_calories("NaN").is_err());
        assert!(parse_calories("-inf").is_err());
        assert_eq!(parse_limit("-5").unwrap(), -5.0);
    }
}
