// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Utility types and re-exports provided by the kernel crate.

mod static_ref;
pub use self::static_ref::StaticRef;

/// The Tock Register Interface.
///
/// This is a re-export of the `tock-registers` crate provided for
/// convenience.
///
/// The Tock Register Interface provides a mechanism for accessing hardware
/// registers and MMIO interfaces.
pub mod registers {
    pub use tock_registers::interfaces;
    pub use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
    pub use tock_registers::LocalRegisterCopy;
    pub use tock_registers::{register_bitfields, register_structs};
}

/// The Tock `Cell` types.
///
/// This is a re-export of the `tock-cells` crate provided for convenience.
///
/// To use `TakeCell`, for example, users should use:
///
///     use kernel::utilities::cells::TakeCell;
pub mod cells {
    pub use tock_cells::optional_cell::OptionalCell;
    pub use tock_cells::take_cell::TakeCell;
}
