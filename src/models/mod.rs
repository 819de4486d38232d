// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model and state machines for the form and the card.

pub mod handoff;
pub mod intake;
pub mod presentation;
pub mod record;
pub mod validation;
