// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Interrupt driven UART on an SCI_B channel.
//!
//! The engine moves data between lent buffers and the channel FIFOs from four
//! interrupt sources:
//!
//! - TXI refills the transmit FIFO. Once the last symbol is queued the
//!   client sees `TxDataEmpty` and TXI is swapped for TEI.
//! - TEI fires after the last stop bit and completes the write.
//! - RXI drains the receive FIFO into the read buffer with ERI masked and
//!   completes the read once the requested count is reached.
//! - ERI reports overrun, framing, break and parity errors. An error halts
//!   the active read; its buffer and remaining count stay with the driver
//!   until `read_stop` or `abort` hands them back.
//!
//! Control operations only touch transfer state while the matching interrupt
//! is disabled, so no lock is needed between mainline code and the handlers.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! let uart_config = static_init!(
//!     UartConfig<'static, SciBUartExtendedConfig<'static>>,
//!     UartConfig {
//!         channel: 0,
//!         width: Width::Eight,
//!         parity: Parity::None,
//!         stop_bits: StopBits::One,
//!         rxi_irq: Some(4),
//!         txi_irq: Some(5),
//!         tei_irq: Some(6),
//!         eri_irq: Some(7),
//!         client: console,
//!         context: 0,
//!         extend: SciBUartExtendedConfig {
//!             clock: ClockSource::Internal,
//!             rx_edge_start: StartBitDetect::FallingEdge,
//!             noise_cancel: false,
//!             baud_setting: sci_b_baud::calculate(PCLK_HZ, 115_200, false, 5000)?,
//!             rx_fifo_trigger: 15,
//!             flow_control_pin: None,
//!             flow_control: FlowControl::Rts,
//!             rs485_setting: Rs485Setting::DISABLED,
//!         },
//!     }
//! );
//! uart.open(uart_config)?;
//! uart.write(buffer, len).map_err(|(err, _)| err)?;
//! ```

use core::cell::Cell;

use kernel::config::CONFIG;
use kernel::debug;
use kernel::hil::gpio::Output;
use kernel::hil::uart::{
    self, CallbackArgs, Client, Direction, Event, Info, Parity, Reclaimed, StopBits, UartConfig,
    Width,
};
use kernel::platform::chip::InterruptService;
use kernel::utilities::cells::{OptionalCell, TakeCell};
use kernel::ErrorCode;

use crate::sci_b_baud::BaudSetting;

/// Longest transfer a single read or write accepts, in bytes.
const TRANSFER_BYTES_MAX: usize = u32::MAX as usize;

/// Highest receive FIFO trigger level.
pub const RX_FIFO_TRIGGER_MAX: u8 = 15;

/// Longest DE assertion or negation time, in base clock cycles.
pub const RS485_TIME_MAX: u8 = 31;

/// Source of the bit-rate clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockSource {
    /// On-chip baud rate generator.
    Internal,
    /// On-chip baud rate generator, with the bit clock driven out on SCK.
    InternalWithOutput,
    /// Clock on SCK running at 8 times the bit rate.
    External8x,
    /// Clock on SCK running at 16 times the bit rate.
    External16x,
}

impl ClockSource {
    pub fn is_external(self) -> bool {
        match self {
            ClockSource::External8x | ClockSource::External16x => true,
            ClockSource::Internal | ClockSource::InternalWithOutput => false,
        }
    }
}

/// Condition on RXD that starts a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartBitDetect {
    LowLevel = 0,
    FallingEdge = 1,
}

/// Use of the CTS/RTS pins.
///
/// The discriminant is the hardware encoding: bit 0 turns the CTSn_RTSn pin
/// into a CTS input and bit 1 enables the dedicated CTSn pin. Bit 2 marks an
/// RTS output driven by the driver on a GPIO. Values 2 and 4 are not defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FlowControl {
    /// CTSn_RTSn is an RTS output.
    Rts = 0,
    /// CTSn_RTSn is a CTS input.
    Cts = 1,
    /// CTS on CTSn, RTS on CTSn_RTSn.
    HardwareCtsRts = 3,
    /// CTS on CTSn_RTSn, RTS on an external pin.
    CtsRts = 5,
}

impl TryFrom<u8> for FlowControl {
    type Error = ErrorCode;

    fn try_from(value: u8) -> Result<FlowControl, ErrorCode> {
        match value {
            0 => Ok(FlowControl::Rts),
            1 => Ok(FlowControl::Cts),
            3 => Ok(FlowControl::HardwareCtsRts),
            5 => Ok(FlowControl::CtsRts),
            _ => Err(ErrorCode::INVAL),
        }
    }
}

/// Level of the DE signal while a write is in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DePolarity {
    High = 0,
    Low = 1,
}

/// RS-485 driver enable timing around a write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rs485Setting {
    pub enable: bool,
    pub polarity: DePolarity,
    /// Base clock cycles between DE assertion and the first start bit.
    pub assertion_time: u8,
    /// Base clock cycles between the last stop bit and DE negation.
    pub negation_time: u8,
}

impl Rs485Setting {
    pub const DISABLED: Rs485Setting = Rs485Setting {
        enable: false,
        polarity: DePolarity::High,
        assertion_time: 0,
        negation_time: 0,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SciInterrupt {
    /// Receive data full or FIFO trigger reached.
    Rxi,
    /// Transmit data empty.
    Txi,
    /// Transmit end.
    Tei,
    /// Receive error.
    Eri,
}

const ALL_INTERRUPTS: [SciInterrupt; 4] = [
    SciInterrupt::Rxi,
    SciInterrupt::Txi,
    SciInterrupt::Tei,
    SciInterrupt::Eri,
];

/// Receive error flags and the RXD level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineStatus {
    pub overrun: bool,
    pub framing: bool,
    pub parity: bool,
    pub rxd_high: bool,
}

/// The register level operations the UART engine needs from an SCI_B
/// channel.
///
/// [`crate::sci_b::SciB`] implements it on the real registers. Levels are
/// counted in symbols, not bytes.
pub trait SciPeripheral {
    /// Stages in each FIFO, 0 for channels that transfer through TDR/RDR.
    fn fifo_depth(&self) -> usize;

    /// Disable the transmitter, receiver and interrupts, empty the FIFOs,
    /// clear the error flags and put the channel in asynchronous mode.
    fn reset(&self);

    fn set_clock_source(&self, clock: ClockSource);
    fn set_frame_format(&self, width: Width, parity: Parity, stop_bits: StopBits);
    fn set_receive_options(&self, start: StartBitDetect, noise_cancel: bool);

    /// Program the bit-rate generator.
    fn set_baud(&self, setting: BaudSetting);
    fn baud(&self) -> BaudSetting;

    fn set_rx_fifo_trigger(&self, level: u8);
    fn set_flow_control(&self, mode: FlowControl);

    /// Hand the DE signal to the hardware, or release it with `None`.
    fn set_driver_enable(&self, setting: Option<Rs485Setting>);

    fn set_transceiver(&self, transmit: bool, receive: bool);
    /// Whether the transmitter and receiver are enabled.
    fn transceiver(&self) -> (bool, bool);

    fn enable_interrupt(&self, interrupt: SciInterrupt);
    fn disable_interrupt(&self, interrupt: SciInterrupt);
    fn interrupt_enabled(&self, interrupt: SciInterrupt) -> bool;

    /// Symbols queued for transmission.
    fn tx_fifo_level(&self) -> usize;
    fn write_symbol(&self, symbol: u16);

    /// Symbols waiting to be read.
    fn rx_fifo_level(&self) -> usize;
    fn read_symbol(&self) -> u16;
    /// Rearm the receive data ready timeout after the FIFO was drained.
    fn acknowledge_receive(&self);

    fn line_status(&self) -> LineStatus;
    fn clear_line_errors(&self);

    /// Discard queued symbols and stop the frame on the wire. DE is negated.
    fn reset_transmitter(&self);
    /// Discard received symbols.
    fn reset_receiver(&self);
}

/// SCI_B specific part of the UART configuration.
pub struct SciBUartExtendedConfig<'a> {
    pub clock: ClockSource,
    pub rx_edge_start: StartBitDetect,
    pub noise_cancel: bool,
    /// Ignored with an external clock.
    pub baud_setting: BaudSetting,
    /// Receive FIFO fill level that raises RXI, 1 to 15. Channels without a
    /// FIFO only accept 1.
    pub rx_fifo_trigger: u8,
    /// RTS output for [`FlowControl::CtsRts`].
    pub flow_control_pin: Option<&'a dyn Output>,
    pub flow_control: FlowControl,
    pub rs485_setting: Rs485Setting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TxState {
    Idle,
    /// TXI is moving symbols into the FIFO.
    Filling,
    /// Everything is queued, waiting for TEI.
    Draining,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RxState {
    Idle,
    Receiving,
    /// Stopped by a line error, buffer not yet reclaimed.
    Halted,
}

pub struct SciBUart<'a, P: SciPeripheral> {
    sci: &'a P,
    open: Cell<bool>,
    config: OptionalCell<&'a UartConfig<'a, SciBUartExtendedConfig<'a>>>,
    channel: Cell<u8>,
    data_bytes: Cell<usize>,
    bitrate_modulation: Cell<bool>,
    flow_pin: OptionalCell<&'a dyn Output>,
    rx_paused: Cell<bool>,

    client: OptionalCell<&'a dyn Client>,
    context: Cell<usize>,
    callback_memory: OptionalCell<&'a Cell<CallbackArgs>>,

    tx_buffer: TakeCell<'static, [u8]>,
    tx_len: Cell<usize>,
    tx_position: Cell<usize>,
    tx_state: Cell<TxState>,

    rx_buffer: TakeCell<'static, [u8]>,
    rx_len: Cell<usize>,
    rx_position: Cell<usize>,
    rx_state: Cell<RxState>,
}

fn symbol_at(buffer: &[u8], position: usize, width: usize) -> u16 {
    if width == 2 {
        u16::from_le_bytes([buffer[position], buffer[position + 1]])
    } else {
        buffer[position] as u16
    }
}

fn store_symbol(buffer: &mut [u8], position: usize, width: usize, symbol: u16) {
    if width == 2 {
        buffer[position..position + 2].copy_from_slice(&symbol.to_le_bytes());
    } else {
        buffer[position] = symbol as u8;
    }
}

impl<'a, P: SciPeripheral> SciBUart<'a, P> {
    pub const fn new(sci: &'a P) -> SciBUart<'a, P> {
        SciBUart {
            sci,
            open: Cell::new(false),
            config: OptionalCell::empty(),
            channel: Cell::new(0),
            data_bytes: Cell::new(1),
            bitrate_modulation: Cell::new(false),
            flow_pin: OptionalCell::empty(),
            rx_paused: Cell::new(false),
            client: OptionalCell::empty(),
            context: Cell::new(0),
            callback_memory: OptionalCell::empty(),
            tx_buffer: TakeCell::empty(),
            tx_len: Cell::new(0),
            tx_position: Cell::new(0),
            tx_state: Cell::new(TxState::Idle),
            rx_buffer: TakeCell::empty(),
            rx_len: Cell::new(0),
            rx_position: Cell::new(0),
            rx_state: Cell::new(RxState::Idle),
        }
    }

    /// Whether the running bit-rate setting uses modulation.
    pub fn bitrate_modulation(&self) -> bool {
        self.bitrate_modulation.get()
    }

    fn validate(
        &self,
        config: &UartConfig<'a, SciBUartExtendedConfig<'a>>,
    ) -> Result<(), ErrorCode> {
        let extend = &config.extend;

        if config.rxi_irq.is_none()
            || config.txi_irq.is_none()
            || config.tei_irq.is_none()
            || config.eri_irq.is_none()
        {
            return Err(ErrorCode::INVAL);
        }

        if extend.rx_fifo_trigger == 0 || extend.rx_fifo_trigger > RX_FIFO_TRIGGER_MAX {
            return Err(ErrorCode::INVAL);
        }

        if !extend.clock.is_external() && !extend.baud_setting.is_valid() {
            return Err(ErrorCode::INVAL);
        }

        match (extend.flow_control, extend.flow_control_pin.is_some()) {
            (FlowControl::CtsRts, true) => {}
            (FlowControl::CtsRts, false) => return Err(ErrorCode::INVAL),
            (_, true) => return Err(ErrorCode::INVAL),
            (_, false) => {}
        }

        let rs485 = &extend.rs485_setting;
        if rs485.enable {
            if rs485.assertion_time > RS485_TIME_MAX || rs485.negation_time > RS485_TIME_MAX {
                return Err(ErrorCode::INVAL);
            }
            // DE is driven on the CTSn_RTSn pin.
            if extend.flow_control != FlowControl::Rts {
                return Err(ErrorCode::INVAL);
            }
        }

        if self.sci.fifo_depth() == 0 && extend.rx_fifo_trigger > 1 {
            return Err(ErrorCode::NOSUPPORT);
        }

        Ok(())
    }

    fn transfer_len_valid(&self, capacity: usize, len: usize) -> bool {
        len > 0
            && len <= capacity
            && len <= TRANSFER_BYTES_MAX
            && len % self.data_bytes.get() == 0
    }

    fn disable_receive_interrupts(&self) {
        self.sci.disable_interrupt(SciInterrupt::Rxi);
        self.sci.disable_interrupt(SciInterrupt::Eri);
    }

    fn stop_receive(&self) -> (usize, Option<&'static mut [u8]>) {
        self.disable_receive_interrupts();
        self.rx_state.set(RxState::Idle);
        (
            self.rx_len.get() - self.rx_position.get(),
            self.rx_buffer.take(),
        )
    }

    fn cancel(&self, direction: Direction) -> Reclaimed {
        let mut reclaimed = Reclaimed::default();

        if direction != Direction::Receive && self.tx_state.get() != TxState::Idle {
            self.sci.disable_interrupt(SciInterrupt::Txi);
            self.sci.disable_interrupt(SciInterrupt::Tei);
            self.sci.reset_transmitter();
            self.tx_state.set(TxState::Idle);
            reclaimed.tx_remaining = self.tx_len.get() - self.tx_position.get();
            reclaimed.tx_buffer = self.tx_buffer.take();
        }

        if direction != Direction::Transmit && self.rx_state.get() != RxState::Idle {
            let (remaining, buffer) = self.stop_receive();
            self.sci.reset_receiver();
            reclaimed.rx_remaining = remaining;
            reclaimed.rx_buffer = buffer;
        }

        reclaimed
    }

    fn pause_sender(&self, pause: bool) {
        self.flow_pin.map(|pin| {
            if pause {
                pin.set();
            } else {
                pin.clear();
            }
            self.rx_paused.set(pause);
        });
    }

    fn dispatch(&self, event: Event, data: u32, buffer: Option<&'static mut [u8]>) {
        let args = CallbackArgs {
            channel: self.channel.get(),
            event,
            data,
            context: self.context.get(),
        };
        if CONFIG.trace_uart {
            debug!("SCI_B{}: {:?} data {:#x}", args.channel, event, data);
        }
        self.callback_memory.map(|memory| memory.set(args));
        self.client.map(move |client| client.event(&args, buffer));
    }

    /// Service one of the channel's interrupt sources.
    pub fn handle_interrupt(&self, source: SciInterrupt) {
        match source {
            SciInterrupt::Txi => self.fill_transmit_fifo(),
            SciInterrupt::Tei => self.transmit_end(),
            SciInterrupt::Rxi => self.drain_receive_fifo(),
            SciInterrupt::Eri => self.receive_error(),
        }
    }

    fn fill_transmit_fifo(&self) {
        if self.tx_state.get() != TxState::Filling {
            self.sci.disable_interrupt(SciInterrupt::Txi);
            return;
        }

        let room = match self.sci.fifo_depth() {
            0 => 1,
            depth => depth.saturating_sub(self.sci.tx_fifo_level()),
        };
        let width = self.data_bytes.get();
        let end = self.tx_len.get();

        let position = self.tx_buffer.map_or(end, |buffer| {
            let mut position = self.tx_position.get();
            for _ in 0..room {
                if position >= end {
                    break;
                }
                self.sci.write_symbol(symbol_at(buffer, position, width));
                position += width;
            }
            position
        });
        self.tx_position.set(position);

        if position >= end {
            self.sci.disable_interrupt(SciInterrupt::Txi);
            self.tx_state.set(TxState::Draining);
            self.sci.enable_interrupt(SciInterrupt::Tei);
            self.dispatch(Event::TxDataEmpty, 0, None);
        }
    }

    fn transmit_end(&self) {
        self.sci.disable_interrupt(SciInterrupt::Tei);
        if self.tx_state.get() != TxState::Draining {
            return;
        }
        self.tx_state.set(TxState::Idle);
        let buffer = self.tx_buffer.take();
        self.dispatch(Event::TxComplete, 0, buffer);
    }

    fn drain_receive_fifo(&self) {
        if self.rx_state.get() != RxState::Receiving {
            self.disable_receive_interrupts();
            return;
        }

        // ERI stays masked while symbols are copied out.
        self.sci.disable_interrupt(SciInterrupt::Eri);
        self.pause_sender(true);
        let width = self.data_bytes.get();
        let end = self.rx_len.get();
        let position = self.rx_buffer.map_or(end, |buffer| {
            let mut position = self.rx_position.get();
            while self.rx_state.get() == RxState::Receiving
                && position < end
                && self.sci.rx_fifo_level() > 0
            {
                store_symbol(buffer, position, width, self.sci.read_symbol());
                position += width;
            }
            position
        });
        self.rx_position.set(position);
        self.pause_sender(false);
        self.sci.acknowledge_receive();

        // A line error halted the read while it was being drained.
        if self.rx_state.get() != RxState::Receiving {
            return;
        }
        if position >= end {
            let (_, buffer) = self.stop_receive();
            self.dispatch(Event::RxComplete, 0, buffer);
        } else {
            self.sci.enable_interrupt(SciInterrupt::Eri);
        }
    }

    fn receive_error(&self) {
        if !self.open.get() {
            return;
        }
        let status = self.sci.line_status();
        let event = if status.overrun {
            Event::OverrunError
        } else if status.framing {
            if status.rxd_high {
                Event::FramingError
            } else {
                Event::BreakDetect
            }
        } else if status.parity {
            Event::ParityError
        } else {
            return;
        };

        let data = if self.sci.rx_fifo_level() > 0 {
            self.sci.read_symbol() as u32
        } else {
            0
        };
        self.sci.clear_line_errors();

        if self.rx_state.get() == RxState::Receiving {
            self.disable_receive_interrupts();
            self.rx_state.set(RxState::Halted);
        }

        self.dispatch(event, data, None);
    }
}

impl<'a, P: SciPeripheral> uart::Uart<'a> for SciBUart<'a, P> {
    type Extended = SciBUartExtendedConfig<'a>;
    type BaudSetting = BaudSetting;

    fn open(
        &self,
        config: &'a UartConfig<'a, SciBUartExtendedConfig<'a>>,
    ) -> Result<(), ErrorCode> {
        if self.open.get() {
            return Err(ErrorCode::ALREADY);
        }
        self.validate(config)?;

        let extend = &config.extend;
        self.sci.reset();
        self.sci.set_clock_source(extend.clock);
        if !extend.clock.is_external() {
            self.sci.set_baud(extend.baud_setting);
        }
        self.sci.set_frame_format(config.width, config.parity, config.stop_bits);
        self.sci
            .set_receive_options(extend.rx_edge_start, extend.noise_cancel);
        if self.sci.fifo_depth() > 0 {
            self.sci.set_rx_fifo_trigger(extend.rx_fifo_trigger);
        }
        self.sci.set_flow_control(extend.flow_control);
        if extend.rs485_setting.enable {
            self.sci.set_driver_enable(Some(extend.rs485_setting));
        } else {
            self.sci.set_driver_enable(None);
        }

        // Ready to receive.
        if let Some(pin) = extend.flow_control_pin {
            pin.clear();
        }
        self.flow_pin.insert(extend.flow_control_pin);
        self.rx_paused.set(false);

        self.channel.set(config.channel);
        self.data_bytes.set(config.width.bytes_per_symbol());
        self.bitrate_modulation
            .set(!extend.clock.is_external() && extend.baud_setting.brme());
        self.client.set(config.client);
        self.context.set(config.context);
        self.callback_memory.clear();
        self.tx_state.set(TxState::Idle);
        self.rx_state.set(RxState::Idle);
        self.config.set(config);

        self.sci.set_transceiver(true, true);
        self.open.set(true);

        if CONFIG.trace_uart {
            debug!(
                "SCI_B{}: open {:?} {:?} {:?} {:?}",
                config.channel, config.width, config.parity, config.stop_bits, extend.clock
            );
        }
        Ok(())
    }

    fn close(&self) -> Result<Reclaimed, ErrorCode> {
        if !self.open.get() {
            return Err(ErrorCode::OFF);
        }

        for interrupt in ALL_INTERRUPTS {
            self.sci.disable_interrupt(interrupt);
        }
        let reclaimed = self.cancel(Direction::Both);
        self.sci.set_transceiver(false, false);
        self.sci.reset();

        if let Some(pin) = self.flow_pin.take() {
            pin.clear();
        }
        self.rx_paused.set(false);
        self.client.clear();
        self.context.set(0);
        self.callback_memory.clear();
        self.config.clear();
        self.open.set(false);

        if CONFIG.trace_uart {
            debug!("SCI_B{}: close", self.channel.get());
        }
        Ok(reclaimed)
    }

    fn write(
        &self,
        buffer: &'static mut [u8],
        len: usize,
    ) -> Result<(), (ErrorCode, &'static mut [u8])> {
        if !self.open.get() {
            return Err((ErrorCode::OFF, buffer));
        }
        if !self.transfer_len_valid(buffer.len(), len) {
            return Err((ErrorCode::INVAL, buffer));
        }
        if self.tx_state.get() != TxState::Idle {
            return Err((ErrorCode::BUSY, buffer));
        }

        self.tx_buffer.replace(buffer);
        self.tx_len.set(len);
        self.tx_position.set(0);
        self.tx_state.set(TxState::Filling);
        self.sci.enable_interrupt(SciInterrupt::Txi);
        Ok(())
    }

    fn read(
        &self,
        buffer: &'static mut [u8],
        len: usize,
    ) -> Result<(), (ErrorCode, &'static mut [u8])> {
        if !self.open.get() {
            return Err((ErrorCode::OFF, buffer));
        }
        if !self.transfer_len_valid(buffer.len(), len) {
            return Err((ErrorCode::INVAL, buffer));
        }
        if self.rx_state.get() != RxState::Idle {
            return Err((ErrorCode::BUSY, buffer));
        }

        self.rx_buffer.replace(buffer);
        self.rx_len.set(len);
        self.rx_position.set(0);
        self.rx_state.set(RxState::Receiving);
        self.sci.enable_interrupt(SciInterrupt::Rxi);
        self.sci.enable_interrupt(SciInterrupt::Eri);
        Ok(())
    }

    fn read_stop(&self) -> Result<(usize, Option<&'static mut [u8]>), ErrorCode> {
        if !self.open.get() {
            return Err(ErrorCode::OFF);
        }
        if self.rx_state.get() == RxState::Idle {
            return Ok((0, None));
        }
        Ok(self.stop_receive())
    }

    fn abort(&self, direction: Direction) -> Result<Reclaimed, ErrorCode> {
        if !self.open.get() {
            return Err(ErrorCode::OFF);
        }
        Ok(self.cancel(direction))
    }

    fn baud_set(&self, setting: BaudSetting) -> Result<(), ErrorCode> {
        if !self.open.get() {
            return Err(ErrorCode::OFF);
        }
        if self.tx_state.get() != TxState::Idle || self.rx_state.get() != RxState::Idle {
            return Err(ErrorCode::BUSY);
        }
        if self
            .config
            .map_or(false, |config| config.extend.clock.is_external())
        {
            return Err(ErrorCode::NOSUPPORT);
        }
        if !setting.is_valid() {
            return Err(ErrorCode::INVAL);
        }

        // The generator may only change while the transceiver is stopped.
        let (transmit, receive) = self.sci.transceiver();
        self.sci.set_transceiver(false, false);
        self.sci.set_baud(setting);
        self.sci.set_transceiver(transmit, receive);
        self.bitrate_modulation.set(setting.brme());

        if CONFIG.trace_uart {
            debug!("SCI_B{}: baud {:?}", self.channel.get(), setting);
        }
        Ok(())
    }

    fn info(&self) -> Result<Info, ErrorCode> {
        if !self.open.get() {
            return Err(ErrorCode::OFF);
        }

        let width = self.data_bytes.get();
        let tx_remaining = match self.tx_state.get() {
            TxState::Filling => self.tx_len.get() - self.tx_position.get(),
            TxState::Idle | TxState::Draining => 0,
        };
        let rx_remaining = match self.rx_state.get() {
            RxState::Idle => 0,
            RxState::Receiving | RxState::Halted => self.rx_len.get() - self.rx_position.get(),
        };

        Ok(Info {
            write_bytes_max: TRANSFER_BYTES_MAX - TRANSFER_BYTES_MAX % width,
            read_bytes_max: self.sci.rx_fifo_level() * width,
            tx_remaining,
            rx_remaining,
            rx_paused: self.rx_paused.get(),
            rx_line_high: self.sci.line_status().rxd_high,
        })
    }

    fn callback_set(
        &self,
        client: &'a dyn Client,
        context: usize,
        args_memory: Option<&'a Cell<CallbackArgs>>,
    ) -> Result<(), ErrorCode> {
        if !self.open.get() {
            return Err(ErrorCode::OFF);
        }

        let enabled = ALL_INTERRUPTS.map(|interrupt| self.sci.interrupt_enabled(interrupt));
        for interrupt in ALL_INTERRUPTS {
            self.sci.disable_interrupt(interrupt);
        }

        self.client.set(client);
        self.context.set(context);
        self.callback_memory.insert(args_memory);

        for (interrupt, was_enabled) in ALL_INTERRUPTS.into_iter().zip(enabled) {
            if was_enabled {
                self.sci.enable_interrupt(interrupt);
            }
        }
        Ok(())
    }
}

impl<'a, P: SciPeripheral> InterruptService for SciBUart<'a, P> {
    unsafe fn service_interrupt(&self, interrupt: u32) -> bool {
        let source = self.config.get().and_then(|config| {
            if config.rxi_irq == Some(interrupt) {
                Some(SciInterrupt::Rxi)
            } else if config.txi_irq == Some(interrupt) {
                Some(SciInterrupt::Txi)
            } else if config.tei_irq == Some(interrupt) {
                Some(SciInterrupt::Tei)
            } else if config.eri_irq == Some(interrupt) {
                Some(SciInterrupt::Eri)
            } else {
                None
            }
        });

        match source {
            Some(source) => {
                self.handle_interrupt(source);
                true
            }
            None => false,
        }
    }
}
