// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data handed from the intake form to the card view.

use super::record::ValidatedRecord;
use crate::io::encoder::{is_png_data_url, Artifact};
use serde::{Deserialize, Serialize};

/// Raised when the card view is opened without a usable payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MissingHandoffState {
    #[error("no card data was handed over")]
    Absent,

    #[error("card data is incomplete: {0}")]
    Malformed(&'static str),
}

/// Everything the card view needs, nothing it may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffPayload {
    pub name: String,
    pub batch: String,
    pub degree: String,
    pub photo_url: String,
    pub qr_url: String,
}

impl HandoffPayload {
    /// Pair a submitted record with its artifact.
    pub fn new(record: &ValidatedRecord, artifact: &Artifact) -> Self {
        let fields = record.record();
        Self {
            name: fields.name.clone(),
            batch: fields.batch.clone(),
            degree: fields.branch.clone(),
            photo_url: fields.photo_url.clone(),
            qr_url: artifact.data_url(),
        }
    }

    /// Reject payloads the card cannot be drawn from.
    pub fn check(&self) -> Result<(), MissingHandoffState> {
        if self.name.trim().is_empty() {
            return Err(MissingHandoffState::Malformed("name is empty"));
        }
        if !is_png_data_url(&self.qr_url) {
            return Err(MissingHandoffState::Malformed("QR image is missing"));
        }
        Ok(())
    }
}
