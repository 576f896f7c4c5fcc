// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Interfaces for individual MCUs.

/// Interface for handling interrupts on a hardware chip.
///
/// When an interrupt (identified by number) has triggered and should be
/// handled, the implementation of this trait will be called with the interrupt
/// number. The implementation can then handle the interrupt, or return `false`
/// to signify that it does not know how to handle the interrupt.
///
/// This lets several objects be chained together to handle the interrupts of
/// a chip. The interrupt number is passed "top-down": the most specific object
/// sees it first, and anything it does not recognize is forwarded to the next
/// object until one handles it or the chain ends.
///
/// ```ignore
/// unsafe fn service_interrupt(&self, interrupt: u32) -> bool {
///     self.sci0.service_interrupt(interrupt)
///         || self.sci1.service_interrupt(interrupt)
///         || self.base.service_interrupt(interrupt)
/// }
/// ```
pub trait InterruptService {
    /// Service an interrupt, if supported by this chip. If this interrupt
    /// number is not supported, return false.
    unsafe fn service_interrupt(&self, interrupt: u32) -> bool;
}
