// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Tock Cell types.

#![no_std]

pub mod optional_cell;
pub mod take_cell;
