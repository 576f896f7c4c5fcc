// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! SCI_B serial communication interface, asynchronous mode.
//!
//! `SciB` implements [`SciPeripheral`] directly on the memory mapped
//! registers. Only the registers used in asynchronous mode are named; the
//! smart card, simple I2C/SPI and manchester registers fall into the reserved
//! gaps.

use kernel::hil::uart::{Parity, StopBits, Width};
use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use kernel::utilities::registers::{
    register_bitfields, register_structs, ReadOnly, ReadWrite, WriteOnly,
};
use kernel::utilities::StaticRef;

use crate::sci_b_baud::BaudSetting;
use crate::sci_b_uart::{
    ClockSource, FlowControl, LineStatus, Rs485Setting, SciInterrupt, SciPeripheral,
    StartBitDetect,
};

register_structs! {
    pub SciBRegisters {
        /// Receive Data Register
        (0x000 => rdr: ReadOnly<u32, RDR::Register>),
        /// Transmit Data Register
        (0x004 => tdr: WriteOnly<u32, TDR::Register>),
        /// Common Control Register 0
        (0x008 => ccr0: ReadWrite<u32, CCR0::Register>),
        /// Common Control Register 1
        (0x00C => ccr1: ReadWrite<u32, CCR1::Register>),
        /// Common Control Register 2, holds the bit-rate generator setting
        (0x010 => ccr2: ReadWrite<u32, CCR2::Register>),
        /// Common Control Register 3
        (0x014 => ccr3: ReadWrite<u32, CCR3::Register>),
        (0x018 => _reserved0),
        /// FIFO Control Register
        (0x024 => fcr: ReadWrite<u32, FCR::Register>),
        (0x028 => _reserved1),
        /// Driver Control Register
        (0x030 => dcr: ReadWrite<u32, DCR::Register>),
        (0x034 => _reserved2),
        /// Common Status Register
        (0x048 => csr: ReadOnly<u32, CSR::Register>),
        (0x04C => _reserved3),
        /// FIFO Receive Status Register
        (0x050 => frsr: ReadOnly<u32, FRSR::Register>),
        /// FIFO Transmit Status Register
        (0x054 => ftsr: ReadOnly<u32, FTSR::Register>),
        (0x058 => _reserved4),
        /// Common Flag Clear Register
        (0x068 => cfclr: WriteOnly<u32, CFCLR::Register>),
        (0x06C => _reserved5),
        /// FIFO Flag Clear Register
        (0x070 => ffclr: WriteOnly<u32, FFCLR::Register>),
        (0x074 => @END),
    }
}

register_bitfields![u32,
    pub RDR [
        RDAT OFFSET(0) NUMBITS(9) []
    ],
    pub TDR [
        TDAT OFFSET(0) NUMBITS(9) []
    ],
    pub CCR0 [
        /// Receive Enable
        RE OFFSET(0) NUMBITS(1) [],
        /// Transmit Enable
        TE OFFSET(4) NUMBITS(1) [],
        /// Receive Interrupt Enable, gates both RXI and ERI
        RIE OFFSET(16) NUMBITS(1) [],
        /// Transmit Interrupt Enable
        TIE OFFSET(20) NUMBITS(1) [],
        /// Transmit End Interrupt Enable
        TEIE OFFSET(21) NUMBITS(1) []
    ],
    pub CCR1 [
        /// CTS function enable on the CTSn_RTSn pin
        CTSE OFFSET(0) NUMBITS(1) [],
        /// Dedicated CTSn pin enable
        CTSPEN OFFSET(1) NUMBITS(1) [],
        /// Parity Enable
        PE OFFSET(8) NUMBITS(1) [],
        /// Parity Mode
        PM OFFSET(9) NUMBITS(1) [
            Even = 0,
            Odd = 1
        ],
        /// Noise Filter Clock Select
        NFCS OFFSET(24) NUMBITS(3) [],
        /// Digital Noise Filter Enable
        NFEN OFFSET(28) NUMBITS(1) []
    ],
    pub CCR2 [
        /// Baud Rate Generator Double-Speed Mode Select
        BGDM OFFSET(4) NUMBITS(1) [],
        /// Asynchronous Mode Base Clock Select
        ABCS OFFSET(5) NUMBITS(1) [],
        /// Asynchronous Mode Extended Base Clock Select
        ABCSE OFFSET(6) NUMBITS(1) [],
        /// Bit Rate Register
        BRR OFFSET(8) NUMBITS(8) [],
        /// Bit Rate Modulation Enable
        BRME OFFSET(16) NUMBITS(1) [],
        /// Clock Select, divides the peripheral clock by 4^CKS
        CKS OFFSET(20) NUMBITS(2) [],
        /// Modulation Duty Register
        MDDR OFFSET(24) NUMBITS(8) []
    ],
    pub CCR3 [
        /// Character Length
        CHR OFFSET(8) NUMBITS(2) [
            Nine = 0,
            Eight = 2,
            Seven = 3
        ],
        /// LSB First select
        LSBF OFFSET(12) NUMBITS(1) [],
        /// Stop Bit Length
        STP OFFSET(14) NUMBITS(1) [
            One = 0,
            Two = 1
        ],
        /// Receive Data Sampling Timing Select, picks the start bit condition
        RXDESEL OFFSET(15) NUMBITS(1) [
            LowLevel = 0,
            FallingEdge = 1
        ],
        /// Communication Mode
        MOD OFFSET(16) NUMBITS(3) [
            Asynchronous = 0
        ],
        /// FIFO Mode Select
        FM OFFSET(20) NUMBITS(1) [],
        /// Driver Enable
        DEN OFFSET(21) NUMBITS(1) [],
        /// Clock Enable
        CKE OFFSET(24) NUMBITS(2) [
            Internal = 0,
            InternalWithOutput = 1,
            External = 2
        ]
    ],
    pub FCR [
        /// Receive data ready error select
        DRES OFFSET(0) NUMBITS(1) [],
        /// Transmit FIFO Data Trigger Number
        TTRG OFFSET(8) NUMBITS(5) [],
        /// Transmit FIFO Data Register Reset
        TFRST OFFSET(15) NUMBITS(1) [],
        /// Receive FIFO Data Trigger Number
        RTRG OFFSET(16) NUMBITS(5) [],
        /// Receive FIFO Data Register Reset
        RFRST OFFSET(23) NUMBITS(1) []
    ],
    pub DCR [
        /// Driver Enable Polarity Select
        DEPOL OFFSET(0) NUMBITS(1) [
            High = 0,
            Low = 1
        ],
        /// Driver Enable Assertion Time
        DEAST OFFSET(8) NUMBITS(5) [],
        /// Driver Enable Negation Time
        DENGT OFFSET(16) NUMBITS(5) []
    ],
    pub CSR [
        /// RXDn Pin Level Monitor
        RXDMON OFFSET(15) NUMBITS(1) [],
        /// Overrun Error Flag
        ORER OFFSET(24) NUMBITS(1) [],
        /// Parity Error Flag
        PER OFFSET(27) NUMBITS(1) [],
        /// Framing Error Flag
        FER OFFSET(28) NUMBITS(1) [],
        /// Transmit Data Empty Flag
        TDRE OFFSET(29) NUMBITS(1) [],
        /// Transmit End Flag
        TEND OFFSET(30) NUMBITS(1) [],
        /// Receive Data Full Flag
        RDRF OFFSET(31) NUMBITS(1) []
    ],
    pub FRSR [
        /// Receive Data Ready Flag
        DR OFFSET(0) NUMBITS(1) [],
        /// Receive FIFO Data Count
        R OFFSET(8) NUMBITS(6) []
    ],
    pub FTSR [
        /// Transmit FIFO Data Count
        T OFFSET(0) NUMBITS(6) []
    ],
    pub CFCLR [
        ORERC OFFSET(24) NUMBITS(1) [],
        PERC OFFSET(27) NUMBITS(1) [],
        FERC OFFSET(28) NUMBITS(1) []
    ],
    pub FFCLR [
        /// Receive Data Ready Flag Clear
        DRC OFFSET(0) NUMBITS(1) []
    ]
];

pub const SCI_B0_BASE: StaticRef<SciBRegisters> =
    unsafe { StaticRef::new(0x4035_8000 as *const SciBRegisters) };
pub const SCI_B1_BASE: StaticRef<SciBRegisters> =
    unsafe { StaticRef::new(0x4035_8100 as *const SciBRegisters) };
pub const SCI_B2_BASE: StaticRef<SciBRegisters> =
    unsafe { StaticRef::new(0x4035_8200 as *const SciBRegisters) };
pub const SCI_B3_BASE: StaticRef<SciBRegisters> =
    unsafe { StaticRef::new(0x4035_8300 as *const SciBRegisters) };
pub const SCI_B4_BASE: StaticRef<SciBRegisters> =
    unsafe { StaticRef::new(0x4035_8400 as *const SciBRegisters) };
pub const SCI_B9_BASE: StaticRef<SciBRegisters> =
    unsafe { StaticRef::new(0x4035_8900 as *const SciBRegisters) };

/// FIFO stages per channel, indexed by channel number. Channels without a
/// FIFO transfer one symbol at a time through TDR/RDR.
pub const SCI_B_FIFO_DEPTH: [usize; 10] = [16, 16, 0, 0, 0, 0, 0, 0, 0, 0];

pub struct SciB {
    registers: StaticRef<SciBRegisters>,
    fifo_depth: usize,
}

impl SciB {
    pub const fn new(base: StaticRef<SciBRegisters>, fifo_depth: usize) -> SciB {
        SciB {
            registers: base,
            fifo_depth,
        }
    }

    fn clear_error_flags(&self) {
        self.registers
            .cfclr
            .write(CFCLR::ORERC::SET + CFCLR::PERC::SET + CFCLR::FERC::SET);
        if self.fifo_depth > 0 {
            self.registers.ffclr.write(FFCLR::DRC::SET);
        }
    }
}

impl SciPeripheral for SciB {
    fn fifo_depth(&self) -> usize {
        self.fifo_depth
    }

    fn reset(&self) {
        let regs = self.registers;

        regs.ccr0.set(0);
        regs.ccr1.set(0);
        regs.ccr3.write(
            CCR3::MOD::Asynchronous
                + CCR3::CHR::Eight
                + CCR3::LSBF::SET
                + CCR3::FM.val((self.fifo_depth > 0) as u32),
        );
        regs.dcr.set(0);
        if self.fifo_depth > 0 {
            regs.fcr.write(FCR::TFRST::SET + FCR::RFRST::SET);
        }
        self.clear_error_flags();
    }

    fn set_clock_source(&self, clock: ClockSource) {
        let regs = self.registers;
        match clock {
            ClockSource::Internal => regs.ccr3.modify(CCR3::CKE::Internal),
            ClockSource::InternalWithOutput => regs.ccr3.modify(CCR3::CKE::InternalWithOutput),
            ClockSource::External8x => {
                regs.ccr3.modify(CCR3::CKE::External);
                regs.ccr2.write(CCR2::ABCS::SET);
            }
            ClockSource::External16x => {
                regs.ccr3.modify(CCR3::CKE::External);
                regs.ccr2.write(CCR2::ABCS::CLEAR);
            }
        }
    }

    fn set_frame_format(&self, width: Width, parity: Parity, stop_bits: StopBits) {
        let regs = self.registers;
        let chr = match width {
            Width::Seven => CCR3::CHR::Seven,
            Width::Eight => CCR3::CHR::Eight,
            Width::Nine => CCR3::CHR::Nine,
        };
        let stp = match stop_bits {
            StopBits::One => CCR3::STP::One,
            StopBits::Two => CCR3::STP::Two,
        };
        regs.ccr3.modify(chr + stp);

        match parity {
            Parity::None => regs.ccr1.modify(CCR1::PE::CLEAR),
            Parity::Even => regs.ccr1.modify(CCR1::PE::SET + CCR1::PM::Even),
            Parity::Odd => regs.ccr1.modify(CCR1::PE::SET + CCR1::PM::Odd),
        }
    }

    fn set_receive_options(&self, start: StartBitDetect, noise_cancel: bool) {
        let regs = self.registers;
        regs.ccr3.modify(CCR3::RXDESEL.val(start as u32));
        regs.ccr1
            .modify(CCR1::NFCS.val(0) + CCR1::NFEN.val(noise_cancel as u32));
    }

    fn set_baud(&self, setting: BaudSetting) {
        self.registers.ccr2.set(setting.get());
    }

    fn baud(&self) -> BaudSetting {
        BaudSetting::from(self.registers.ccr2.get())
    }

    fn set_rx_fifo_trigger(&self, level: u8) {
        // TXI when the transmit FIFO is empty.
        self.registers
            .fcr
            .modify(FCR::RTRG.val(level as u32) + FCR::TTRG.val(0) + FCR::DRES::CLEAR);
    }

    fn set_flow_control(&self, mode: FlowControl) {
        let bits = mode as u32;
        self.registers
            .ccr1
            .modify(CCR1::CTSE.val(bits & 1) + CCR1::CTSPEN.val((bits >> 1) & 1));
    }

    fn set_driver_enable(&self, setting: Option<Rs485Setting>) {
        let regs = self.registers;
        match setting {
            Some(setting) => {
                regs.dcr.write(
                    DCR::DEPOL.val(setting.polarity as u32)
                        + DCR::DEAST.val(setting.assertion_time as u32)
                        + DCR::DENGT.val(setting.negation_time as u32),
                );
                regs.ccr3.modify(CCR3::DEN::SET);
            }
            None => {
                regs.ccr3.modify(CCR3::DEN::CLEAR);
                regs.dcr.set(0);
            }
        }
    }

    fn set_transceiver(&self, transmit: bool, receive: bool) {
        self.registers
            .ccr0
            .modify(CCR0::TE.val(transmit as u32) + CCR0::RE.val(receive as u32));
    }

    fn transceiver(&self) -> (bool, bool) {
        let ccr0 = self.registers.ccr0.extract();
        (ccr0.is_set(CCR0::TE), ccr0.is_set(CCR0::RE))
    }

    fn enable_interrupt(&self, interrupt: SciInterrupt) {
        let regs = self.registers;
        match interrupt {
            SciInterrupt::Rxi | SciInterrupt::Eri => regs.ccr0.modify(CCR0::RIE::SET),
            SciInterrupt::Txi => regs.ccr0.modify(CCR0::TIE::SET),
            SciInterrupt::Tei => regs.ccr0.modify(CCR0::TEIE::SET),
        }
    }

    fn disable_interrupt(&self, interrupt: SciInterrupt) {
        let regs = self.registers;
        match interrupt {
            SciInterrupt::Rxi | SciInterrupt::Eri => regs.ccr0.modify(CCR0::RIE::CLEAR),
            SciInterrupt::Txi => regs.ccr0.modify(CCR0::TIE::CLEAR),
            SciInterrupt::Tei => regs.ccr0.modify(CCR0::TEIE::CLEAR),
        }
    }

    fn interrupt_enabled(&self, interrupt: SciInterrupt) -> bool {
        let regs = self.registers;
        match interrupt {
            SciInterrupt::Rxi | SciInterrupt::Eri => regs.ccr0.is_set(CCR0::RIE),
            SciInterrupt::Txi => regs.ccr0.is_set(CCR0::TIE),
            SciInterrupt::Tei => regs.ccr0.is_set(CCR0::TEIE),
        }
    }

    fn tx_fifo_level(&self) -> usize {
        if self.fifo_depth > 0 {
            self.registers.ftsr.read(FTSR::T) as usize
        } else if self.registers.csr.is_set(CSR::TDRE) {
            0
        } else {
            1
        }
    }

    fn write_symbol(&self, symbol: u16) {
        self.registers.tdr.write(TDR::TDAT.val(symbol as u32));
    }

    fn rx_fifo_level(&self) -> usize {
        if self.fifo_depth > 0 {
            self.registers.frsr.read(FRSR::R) as usize
        } else {
            self.registers.csr.is_set(CSR::RDRF) as usize
        }
    }

    fn read_symbol(&self) -> u16 {
        self.registers.rdr.read(RDR::RDAT) as u16
    }

    fn acknowledge_receive(&self) {
        // DR latches on the FIFO timeout and only raises RXI again once
        // cleared.
        if self.fifo_depth > 0 {
            self.registers.ffclr.write(FFCLR::DRC::SET);
        }
    }

    fn line_status(&self) -> LineStatus {
        let csr = self.registers.csr.extract();
        LineStatus {
            overrun: csr.is_set(CSR::ORER),
            framing: csr.is_set(CSR::FER),
            parity: csr.is_set(CSR::PER),
            rxd_high: csr.is_set(CSR::RXDMON),
        }
    }

    fn clear_line_errors(&self) {
        self.clear_error_flags();
    }

    fn reset_transmitter(&self) {
        let regs = self.registers;
        // Dropping TE ends the frame and negates DE.
        regs.ccr0
            .modify(CCR0::TE::CLEAR + CCR0::TIE::CLEAR + CCR0::TEIE::CLEAR);
        if self.fifo_depth > 0 {
            regs.fcr.modify(FCR::TFRST::SET);
        }
        regs.ccr0.modify(CCR0::TE::SET);
    }

    fn reset_receiver(&self) {
        let regs = self.registers;
        let receiving = regs.ccr0.is_set(CCR0::RE);
        regs.ccr0.modify(CCR0::RE::CLEAR);
        if self.fifo_depth > 0 {
            regs.fcr.modify(FCR::RFRST::SET);
        } else {
            // Discard a symbol left in RDR.
            let _ = regs.rdr.get();
        }
        self.clear_error_flags();
        regs.ccr0.modify(CCR0::RE.val(receiving as u32));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::hil::uart::{Parity, StopBits, Width};
    use std::boxed::Box;

    use crate::sci_b_uart::{DePolarity, Rs485Setting};

    const WORDS: usize = 0x74 / 4;

    /// A channel backed by ordinary memory.
    fn channel(fifo_depth: usize) -> (SciB, *mut u32) {
        let memory = Box::into_raw(Box::new([0u32; WORDS])) as *mut u32;
        let base = unsafe { StaticRef::new(memory as *const SciBRegisters) };
        (SciB::new(base, fifo_depth), memory)
    }

    fn peek(memory: *mut u32, offset: usize) -> u32 {
        unsafe { memory.add(offset / 4).read_volatile() }
    }

    fn poke(memory: *mut u32, offset: usize, value: u32) {
        unsafe { memory.add(offset / 4).write_volatile(value) }
    }

    #[test]
    fn flow_control_encoding_reaches_ccr1() {
        let (sci, memory) = channel(16);

        sci.set_flow_control(FlowControl::HardwareCtsRts);
        assert_eq!(peek(memory, 0x0C) & 0b11, 0b11);
        sci.set_flow_control(FlowControl::CtsRts);
        assert_eq!(peek(memory, 0x0C) & 0b11, 0b01);
        sci.set_flow_control(FlowControl::Rts);
        assert_eq!(peek(memory, 0x0C) & 0b11, 0b00);
    }

    #[test]
    fn receive_and_error_interrupts_share_rie() {
        let (sci, memory) = channel(16);

        sci.enable_interrupt(SciInterrupt::Rxi);
        assert_eq!(peek(memory, 0x08), 1 << 16);
        assert!(sci.interrupt_enabled(SciInterrupt::Eri));

        sci.enable_interrupt(SciInterrupt::Tei);
        sci.disable_interrupt(SciInterrupt::Eri);
        assert!(!sci.interrupt_enabled(SciInterrupt::Rxi));
        assert!(sci.interrupt_enabled(SciInterrupt::Tei));
        assert_eq!(peek(memory, 0x08), 1 << 21);
    }

    #[test]
    fn frame_format_and_baud() {
        let (sci, memory) = channel(16);

        sci.reset();
        sci.set_frame_format(Width::Nine, Parity::Even, StopBits::Two);
        let ccr3 = peek(memory, 0x14);
        assert_eq!((ccr3 >> 8) & 0b11, 0);
        assert_ne!(ccr3 & (1 << 14), 0);
        assert_ne!(ccr3 & (1 << 20), 0);
        assert_eq!(peek(memory, 0x0C) & (0b11 << 8), 1 << 8);

        sci.set_baud(BaudSetting::from(0x0010_CF40));
        assert_eq!(peek(memory, 0x10), 0x0010_CF40);
        assert_eq!(sci.baud(), BaudSetting::from(0x0010_CF40));
    }

    #[test]
    fn driver_enable_timing() {
        let (sci, memory) = channel(16);

        sci.set_driver_enable(Some(Rs485Setting {
            enable: true,
            polarity: DePolarity::Low,
            assertion_time: 3,
            negation_time: 5,
        }));
        assert_eq!(peek(memory, 0x30), 1 | (3 << 8) | (5 << 16));
        assert_ne!(peek(memory, 0x14) & (1 << 21), 0);

        sci.set_driver_enable(None);
        assert_eq!(peek(memory, 0x30), 0);
        assert_eq!(peek(memory, 0x14) & (1 << 21), 0);
    }

    #[test]
    fn fifo_levels() {
        let (with_fifo, memory) = channel(16);
        poke(memory, 0x54, 5);
        poke(memory, 0x50, 7 << 8);
        assert_eq!(with_fifo.tx_fifo_level(), 5);
        assert_eq!(with_fifo.rx_fifo_level(), 7);

        let (single, memory) = channel(0);
        poke(memory, 0x48, 1 << 29);
        assert_eq!(single.tx_fifo_level(), 0);
        assert_eq!(single.rx_fifo_level(), 0);
        poke(memory, 0x48, 1 << 31);
        assert_eq!(single.tx_fifo_level(), 1);
        assert_eq!(single.rx_fifo_level(), 1);

        single.write_symbol(0x1AB);
        assert_eq!(peek(memory, 0x04), 0x1AB);
    }

    #[test]
    fn acknowledge_clears_data_ready() {
        let (with_fifo, memory) = channel(16);
        with_fifo.acknowledge_receive();
        assert_eq!(peek(memory, 0x70), 1);

        // Nothing to rearm without a FIFO.
        let (single, memory) = channel(0);
        single.acknowledge_receive();
        assert_eq!(peek(memory, 0x70), 0);
    }
}
