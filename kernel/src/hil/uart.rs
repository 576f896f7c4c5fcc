// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Interfaces for UART communications.
//!
//! A UART channel is opened with a [`UartConfig`] that stays borrowed until
//! the channel is closed. Transfers are split-phase: `write` and `read` lend a
//! buffer to the driver and return immediately, and the driver hands the
//! buffer back through [`Client::event`] once the transfer finishes. A
//! transfer ended early by `abort`, `read_stop` or `close` returns its buffer
//! synchronously and raises no event.

use core::cell::Cell;

use crate::ErrorCode;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopBits {
    One = 1,
    Two = 2,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parity {
    None = 0,
    Odd = 1,
    Even = 2,
}

/// Number of data bits in a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Width {
    Seven = 7,
    Eight = 8,
    /// Nine-bit symbols occupy two bytes of a transfer buffer, little-endian.
    Nine = 9,
}

impl Width {
    /// Bytes of buffer used per symbol on the wire.
    pub const fn bytes_per_symbol(self) -> usize {
        match self {
            Width::Seven | Width::Eight => 1,
            Width::Nine => 2,
        }
    }
}

/// Events delivered to a UART [`Client`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// All requested bytes of a read were received. Carries the buffer.
    RxComplete,
    /// The last stop bit of a write left the wire. Carries the buffer.
    TxComplete,
    /// The last symbol of a write was handed to the hardware.
    TxDataEmpty,
    ParityError,
    FramingError,
    OverrunError,
    /// A framing error while the receive line was held low.
    BreakDetect,
}

/// Arguments of a single event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CallbackArgs {
    /// Channel that raised the event.
    pub channel: u8,
    pub event: Event,
    /// Received word for line-error events, zero otherwise.
    pub data: u32,
    /// Opaque value registered alongside the client.
    pub context: usize,
}

pub trait Client {
    /// Called from interrupt context for every event of an open channel.
    ///
    /// If the client registered argument memory with [`Uart::callback_set`],
    /// that memory holds the same values as `args` when this runs.
    /// `buffer` is `Some` for [`Event::TxComplete`] and [`Event::RxComplete`].
    fn event(&self, args: &CallbackArgs, buffer: Option<&'static mut [u8]>);
}

/// Which transfer direction(s) an abort applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Transmit,
    Receive,
    Both,
}

/// Snapshot of a channel's state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Info {
    /// Largest number of bytes a single write accepts.
    pub write_bytes_max: usize,
    /// Bytes waiting in the receive FIFO.
    pub read_bytes_max: usize,
    /// Bytes of the active write not yet handed to the hardware.
    pub tx_remaining: usize,
    /// Bytes of the active (or halted) read not yet received.
    pub rx_remaining: usize,
    /// Whether the software RTS output currently holds off the remote
    /// sender.
    pub rx_paused: bool,
    /// Level of the receive data line.
    pub rx_line_high: bool,
}

/// Buffers handed back by `abort` and `close`.
#[derive(Default)]
pub struct Reclaimed {
    pub tx_buffer: Option<&'static mut [u8]>,
    pub tx_remaining: usize,
    pub rx_buffer: Option<&'static mut [u8]>,
    pub rx_remaining: usize,
}

/// Chip independent part of a UART configuration.
///
/// `X` carries the settings specific to one UART implementation.
pub struct UartConfig<'a, X> {
    pub channel: u8,
    pub width: Width,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Receive data full interrupt number.
    pub rxi_irq: Option<u32>,
    /// Transmit data empty interrupt number.
    pub txi_irq: Option<u32>,
    /// Transmit end interrupt number.
    pub tei_irq: Option<u32>,
    /// Receive error interrupt number.
    pub eri_irq: Option<u32>,
    pub client: &'a dyn Client,
    pub context: usize,
    pub extend: X,
}

pub trait Uart<'a> {
    /// Implementation specific part of [`UartConfig`].
    type Extended;
    /// Precomputed baud-rate generator setting.
    type BaudSetting: Copy;

    /// Validate `config` and start the channel.
    ///
    /// Fails with `ALREADY` if the channel is open, `INVAL` if a field is
    /// out of range and `NOSUPPORT` if this channel cannot realize it.
    fn open(&self, config: &'a UartConfig<'a, Self::Extended>) -> Result<(), ErrorCode>;

    /// Stop the channel, dropping any transfer in progress without an event.
    fn close(&self) -> Result<Reclaimed, ErrorCode>;

    /// Transmit the first `len` bytes of `buffer`.
    fn write(
        &self,
        buffer: &'static mut [u8],
        len: usize,
    ) -> Result<(), (ErrorCode, &'static mut [u8])>;

    /// Receive `len` bytes into `buffer`.
    fn read(&self, buffer: &'static mut [u8], len: usize)
        -> Result<(), (ErrorCode, &'static mut [u8])>;

    /// Stop the active read, returning the number of bytes not yet received
    /// and the buffer. Returns `(0, None)` when no read is active.
    fn read_stop(&self) -> Result<(usize, Option<&'static mut [u8]>), ErrorCode>;

    /// Cancel transfers in `direction` without raising events.
    fn abort(&self, direction: Direction) -> Result<Reclaimed, ErrorCode>;

    /// Reprogram the baud-rate generator. Fails with `BUSY` while a transfer
    /// is active.
    fn baud_set(&self, setting: Self::BaudSetting) -> Result<(), ErrorCode>;

    fn info(&self) -> Result<Info, ErrorCode>;

    /// Replace the client and context. When `args_memory` is given, event
    /// arguments are written there before the client runs.
    fn callback_set(
        &self,
        client: &'a dyn Client,
        context: usize,
        args_memory: Option<&'a Cell<CallbackArgs>>,
    ) -> Result<(), ErrorCode>;
}
