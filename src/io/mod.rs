// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for photos, QR artifacts and configuration files.

pub mod encoder;
pub mod media;
pub mod serialization;
