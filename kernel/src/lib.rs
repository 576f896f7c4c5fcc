// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Core Tock kernel pieces shared by the chip drivers.
//!
//! This crate carries the hardware interface layers (HILs) that chip crates
//! implement, the standard [`ErrorCode`] type, the interrupt dispatch trait
//! and the small set of utilities (`StaticRef`, register and cell re-exports,
//! `debug!`) that drivers are written against.

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod config;
pub mod debug;
pub mod errorcode;
pub mod hil;
pub mod platform;
pub mod utilities;

pub use crate::errorcode::ErrorCode;
