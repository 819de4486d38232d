// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Alumni record data structures.
//!
//! This module defines the record captured by the intake form and the
//! frozen snapshot produced when a record passes validation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A form field of the alumni record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Batch,
    Branch,
    Photo,
}

impl Field {
    /// All fields in form order.
    pub const ALL: [Field; 4] = [Field::Name, Field::Batch, Field::Branch, Field::Photo];

    /// Label shown next to the input.
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Batch => "Batch",
            Field::Branch => "Branch",
            Field::Photo => "Photo",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The in-progress alumni record, exactly as typed by the user.
///
/// Field order matters: it is the key order of the serialized payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub batch: String,
    pub branch: String,
    #[serde(rename = "photoUrl")]
    pub photo_url: String,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a field.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Batch => &self.batch,
            Field::Branch => &self.branch,
            Field::Photo => &self.photo_url,
        }
    }

    /// Replace the value of a field.
    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = value,
            Field::Batch => self.batch = value,
            Field::Branch => self.branch = value,
            Field::Photo => self.photo_url = value,
        }
    }
}

/// A record that passed validation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecord {
    record: Record,
}

impl ValidatedRecord {
    /// Only the validator may freeze a record.
    pub(super) fn freeze(record: Record) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Compact JSON payload handed to the encoder.
    pub fn payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.record)
    }
}
