// Copyright 2017-2026 Peter Williams and collaborators
// Licensed under the MIT License.

//! Core types and helpers shared by the fitsutils crates.

pub mod io;
pub mod names;

#[cfg(feature = "notifications")]
#[macro_use]
pub mod notify;
