// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Peripheral implementations for the Renesas RA family.
//!
//! Only the SCI_B serial block is provided: its register map, the peripheral
//! capability the UART engine drives, the bit-rate solver and the interrupt
//! driven UART itself.

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod sci_b;
pub mod sci_b_baud;
pub mod sci_b_uart;
