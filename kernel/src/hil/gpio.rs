// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Interface for driving GPIO pins.
//!
//! Drivers that own an auxiliary control line (a software RTS signal, an
//! RS-485 direction pin) borrow it as `&dyn Output` and never configure it:
//! muxing and direction are the board's job.

pub trait Output {
    /// Set the GPIO pin high. If the pin is not an output or
    /// input/output, this call is ignored.
    fn set(&self);

    /// Set the GPIO pin low. If the pin is not an output or
    /// input/output, this call is ignored.
    fn clear(&self);
}
