// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Data structure for storing compile-time configuration options.
//!
//! Options live in a typed `const` object rather than behind `#[cfg]` gates.
//! Every code path is then type-checked by the compiler, even the disabled
//! ones, and after type-checking the compiler folds the constants so that a
//! boolean condition used in an `if` block costs nothing in the resulting
//! binary.

/// Data structure holding compile-time configuration options.
///
/// To change the configuration, enable the matching cargo feature of the
/// kernel crate from the board crate.
pub struct Config {
    /// Whether UART drivers should trace state transitions to the debug
    /// output.
    ///
    /// If enabled, drivers print a message when a channel is opened, closed
    /// or given a new bit rate, and for each event delivered to their client.
    pub trace_uart: bool,
}

/// A unique instance of `Config` where compile-time configuration options are
/// defined.
pub const CONFIG: Config = Config {
    trace_uart: cfg!(feature = "trace_uart"),
};
