// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Record validation.
//!
//! Validation is a pure function of the record, the configured rules and
//! the current year. It always checks every field so callers get the
//! complete set of messages in one pass.

use super::record::{Field, Record, ValidatedRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Departments offered by the branch drop-down unless configured otherwise.
pub const DEFAULT_BRANCHES: [&str; 9] = [
    "Computer Science and Engineering",
    "Electronics and Communication Engineering",
    "Electrical and Electronics Engineering",
    "Mechanical Engineering",
    "Civil Engineering",
    "Chemical Engineering",
    "Information Technology",
    "Biotechnology",
    "Metallurgical and Materials Engineering",
];

/// Configurable validation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// Whether a photo must be supplied before submission.
    pub photo_required: bool,
    /// First batch year accepted (institution founding year).
    pub earliest_batch: i32,
    /// How many years past the current year a batch may be.
    pub max_years_ahead: i32,
    /// Fixed set of branch names.
    pub branches: Vec<String>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            photo_required: true,
            earliest_batch: 1950,
            max_years_ahead: 6,
            branches: DEFAULT_BRANCHES.iter().map(|b| b.to_string()).collect(),
        }
    }
}

impl ValidationRules {
    /// Latest batch year accepted in the given year.
    pub fn latest_batch(&self, current_year: i32) -> i32 {
        current_year + self.max_years_ahead
    }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    messages: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.messages.insert(field, message.into());
    }

    /// Drop the message for a field, returning whether one existed.
    pub fn clear(&mut self, field: Field) -> bool {
        self.messages.remove(&field).is_some()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.messages.get(&field).map(String::as_str)
    }

    #[cfg(test)]
    pub fn contains(&self, field: Field) -> bool {
        self.messages.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.messages.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a record, freezing it on success.
pub fn validate(
    record: &Record,
    rules: &ValidationRules,
    current_year: i32,
) -> Result<ValidatedRecord, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if record.get(Field::Name).trim().is_empty() {
        errors.insert(Field::Name, "Name is required");
    }

    if let Err(message) = check_batch(&record.batch, rules, current_year) {
        errors.insert(Field::Batch, message);
    }

    let branch = record.get(Field::Branch).trim();
    if branch.is_empty() {
        errors.insert(Field::Branch, "Select your branch");
    } else if !rules.branches.iter().any(|b| b == branch) {
        errors.insert(Field::Branch, "Select a branch from the list");
    }

    if rules.photo_required && record.get(Field::Photo).trim().is_empty() {
        errors.insert(Field::Photo, "A photo is required");
    }

    if errors.is_empty() {
        Ok(ValidatedRecord::freeze(record.clone()))
    } else {
        Err(errors)
    }
}

fn check_batch(batch: &str, rules: &ValidationRules, current_year: i32) -> Result<(), String> {
    let batch = batch.trim();
    if batch.is_empty() {
        return Err("Batch is required".to_string());
    }
    if batch.len() != 4 || !batch.chars().all(|c| c.is_ascii_digit()) {
        return Err("Batch must be a four-digit year".to_string());
    }
    let year: i32 = batch
        .parse()
        .map_err(|_| "Batch must be a four-digit year".to_string())?;

    let latest = rules.latest_batch(current_year);
    if year < rules.earliest_batch || year > latest {
        return Err(format!(
            "Batch must be between {} and {}",
            rules.earliest_batch, latest
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: i32 = 2026;

    fn jane() -> Record {
        Record {
            name: "Jane Doe".to_string(),
            batch: "2020".to_string(),
            branch: "Computer Science and Engineering".to_string(),
            photo_url: "file:///home/jane/photo.png".to_string(),
        }
    }

    #[test]
    fn test_valid_record_passes() {
        let validated = validate(&jane(), &ValidationRules::default(), YEAR).unwrap();
        assert_eq!(validated.record(), &jane());
    }

    #[test]
    fn test_blank_fields_are_rejected() {
        for field in Field::ALL {
            for blank in ["", "   ", "\t\n"] {
                let mut record = jane();
                record.set(field, blank.to_string());

                let errors = validate(&record, &ValidationRules::default(), YEAR).unwrap_err();
                assert!(errors.contains(field), "{:?} = {:?} should fail", field, blank);
                assert_eq!(errors.len(), 1);
            }
        }
    }

    #[test]
    fn test_empty_record_reports_every_field() {
        let errors = validate(&Record::new(), &ValidationRules::default(), YEAR).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_batch_bounds() {
        let rules = ValidationRules::default();
        let cases = [
            ("1800", false),
            ("1949", false),
            ("1950", true),
            ("2032", true),
            ("2033", false),
            ("2076", false),
            ("20x0", false),
            ("20201", false),
            ("-202", false),
        ];

        for (batch, ok) in cases {
            let mut record = jane();
            record.batch = batch.to_string();
            let result = validate(&record, &rules, YEAR);
            assert_eq!(result.is_ok(), ok, "batch {:?}", batch);
        }
    }

    #[test]
    fn test_unknown_branch_is_rejected() {
        let mut record = jane();
        record.branch = "Astrology".to_string();

        let errors = validate(&record, &ValidationRules::default(), YEAR).unwrap_err();
        assert_eq!(errors.get(Field::Branch), Some("Select a branch from the list"));
    }

    #[test]
    fn test_optional_photo_policy() {
        let rules = ValidationRules {
            photo_required: false,
            ..ValidationRules::default()
        };
        let mut record = jane();
        record.photo_url.clear();

        assert!(validate(&record, &rules, YEAR).is_ok());
        assert!(validate(&record, &ValidationRules::default(), YEAR).is_err());
    }

    #[test]
    fn test_clear_single_error() {
        let mut errors = validate(&Record::new(), &ValidationRules::default(), YEAR).unwrap_err();
        assert!(errors.clear(Field::Name));
        assert!(!errors.clear(Field::Name));
        assert!(!errors.contains(Field::Name));
        assert!(errors.contains(Field::Batch));
    }
}
