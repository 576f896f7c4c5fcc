// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! SCI_B bit-rate generator settings.
//!
//! The bit rate of an SCI_B channel in asynchronous mode is
//!
//! ```text
//! rate = f * M / (256 * coefficient * (BRR + 1))
//! ```
//!
//! where `f` is the peripheral clock, `M` the modulation duty (`MDDR` when
//! modulation is enabled, 256 otherwise) and `coefficient` the number of
//! clock cycles per bit selected by the BGDM/ABCS/ABCSE flags and the `CKS`
//! prescaler. [`calculate`] searches that space for a setting within a
//! requested error; errors are expressed in thousandths of a percent, so
//! `5000` allows a 5% deviation.

use core::fmt;

use kernel::utilities::registers::LocalRegisterCopy;
use kernel::ErrorCode;

use crate::sci_b::CCR2;

/// CCR2 bits a baud setting may populate.
const SETTING_MASK: u32 = 0xFF31_FF70;

/// Error values are in thousandths of a percent.
const ERROR_SCALE: u128 = 100_000;

/// Duty applied when modulation is disabled.
const DUTY_FULL: u32 = 256;
const DUTY_MIN: u32 = 128;
const DUTY_MAX: u32 = 255;

/// Highest `BRR + 1`.
const DIVIDER_MAX: u64 = 256;

const fn cycles_per_bit(bgdm: bool, abcs: bool, abcse: bool, cks: u32) -> u32 {
    let base = if abcse {
        6
    } else {
        32 >> (bgdm as u32 + abcs as u32)
    };
    base << (2 * cks)
}

struct Divisor {
    bgdm: bool,
    abcs: bool,
    abcse: bool,
    cks: u32,
    coefficient: u32,
}

impl Divisor {
    const fn new(bgdm: bool, abcs: bool, abcse: bool, cks: u32) -> Divisor {
        Divisor {
            bgdm,
            abcs,
            abcse,
            cks,
            coefficient: cycles_per_bit(bgdm, abcs, abcse, cks),
        }
    }

    fn setting(&self, divider: u64, duty: Option<u32>) -> BaudSetting {
        let mut register = LocalRegisterCopy::new(0);
        register.write(
            CCR2::BGDM.val(self.bgdm as u32)
                + CCR2::ABCS.val(self.abcs as u32)
                + CCR2::ABCSE.val(self.abcse as u32)
                + CCR2::CKS.val(self.cks)
                + CCR2::BRR.val(divider as u32 - 1),
        );
        if let Some(duty) = duty {
            register.modify(CCR2::BRME::SET + CCR2::MDDR.val(duty));
        }
        BaudSetting(register)
    }
}

/// Distinct divisor combinations, ascending by coefficient.
const DIVISORS: [Divisor; 13] = [
    Divisor::new(false, false, true, 0),
    Divisor::new(true, true, false, 0),
    Divisor::new(true, false, false, 0),
    Divisor::new(false, false, true, 1),
    Divisor::new(false, false, false, 0),
    Divisor::new(true, false, false, 1),
    Divisor::new(false, false, true, 2),
    Divisor::new(false, false, false, 1),
    Divisor::new(true, false, false, 2),
    Divisor::new(false, false, true, 3),
    Divisor::new(false, false, false, 2),
    Divisor::new(true, false, false, 3),
    Divisor::new(false, false, false, 3),
];

fn error_x1000(clock_hz: u32, baud_rate: u32, coefficient: u32, divider: u64, duty: u32) -> u32 {
    let ideal = 256 * coefficient as u128 * baud_rate as u128 * divider as u128;
    let actual = clock_hz as u128 * duty as u128;
    let error = actual.abs_diff(ideal) * ERROR_SCALE / ideal;
    error.min(u32::MAX as u128) as u32
}

/// Bit-rate generator setting, laid out exactly as the CCR2 register.
#[derive(Clone, Copy)]
pub struct BaudSetting(LocalRegisterCopy<u32, CCR2::Register>);

impl BaudSetting {
    /// Raw CCR2 value.
    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Baud rate generator double-speed mode.
    pub fn bgdm(&self) -> bool {
        self.0.is_set(CCR2::BGDM)
    }

    /// Asynchronous mode base clock select (8 cycles per bit instead of 16).
    pub fn abcs(&self) -> bool {
        self.0.is_set(CCR2::ABCS)
    }

    /// Asynchronous mode extended base clock select (6 cycles per bit).
    pub fn abcse(&self) -> bool {
        self.0.is_set(CCR2::ABCSE)
    }

    pub fn brr(&self) -> u8 {
        self.0.read(CCR2::BRR) as u8
    }

    pub fn brme(&self) -> bool {
        self.0.is_set(CCR2::BRME)
    }

    pub fn cks(&self) -> u8 {
        self.0.read(CCR2::CKS) as u8
    }

    pub fn mddr(&self) -> u8 {
        self.0.read(CCR2::MDDR) as u8
    }

    /// Peripheral clock cycles per bit for `BRR = 0`, or `None` for a flag
    /// combination the hardware does not define.
    pub fn coefficient(&self) -> Option<u32> {
        if self.abcse() && (self.bgdm() || self.abcs()) {
            return None;
        }
        Some(cycles_per_bit(
            self.bgdm(),
            self.abcs(),
            self.abcse(),
            self.cks() as u32,
        ))
    }

    /// Whether the setting may be written to CCR2: no reserved bits, a
    /// defined clock combination and a duty of at least 50% when modulating.
    pub fn is_valid(&self) -> bool {
        self.get() & !SETTING_MASK == 0
            && self.coefficient().is_some()
            && (!self.brme() || self.mddr() as u32 >= DUTY_MIN)
    }

    fn duty(&self) -> u32 {
        if self.brme() {
            self.mddr() as u32
        } else {
            DUTY_FULL
        }
    }

    /// Bit rate produced from a peripheral clock of `clock_hz`.
    pub fn bit_rate(&self, clock_hz: u32) -> Option<u32> {
        if !self.is_valid() {
            return None;
        }
        let coefficient = self.coefficient()?;
        let divisor = 256 * coefficient as u64 * (self.brr() as u64 + 1);
        Some((clock_hz as u64 * self.duty() as u64 / divisor) as u32)
    }

    /// Deviation from `baud_rate` in thousandths of a percent.
    pub fn bit_rate_error(&self, clock_hz: u32, baud_rate: u32) -> Option<u32> {
        if baud_rate == 0 || !self.is_valid() {
            return None;
        }
        let coefficient = self.coefficient()?;
        Some(error_x1000(
            clock_hz,
            baud_rate,
            coefficient,
            self.brr() as u64 + 1,
            self.duty(),
        ))
    }
}

impl From<u32> for BaudSetting {
    fn from(raw: u32) -> BaudSetting {
        BaudSetting(LocalRegisterCopy::new(raw))
    }
}

impl From<BaudSetting> for u32 {
    fn from(setting: BaudSetting) -> u32 {
        setting.get()
    }
}

impl PartialEq for BaudSetting {
    fn eq(&self, other: &BaudSetting) -> bool {
        self.get() == other.get()
    }
}

impl Eq for BaudSetting {}

impl fmt::Debug for BaudSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaudSetting")
            .field("bgdm", &self.bgdm())
            .field("abcs", &self.abcs())
            .field("abcse", &self.abcse())
            .field("brr", &self.brr())
            .field("brme", &self.brme())
            .field("cks", &self.cks())
            .field("mddr", &self.mddr())
            .finish()
    }
}

struct Candidate {
    setting: BaudSetting,
    error: u32,
}

impl Candidate {
    /// Keeps the first of equal errors, which is the smaller coefficient.
    fn offer(best: &mut Option<Candidate>, setting: BaudSetting, error: u32) {
        let improves = match best {
            Some(current) => error < current.error,
            None => true,
        };
        if improves {
            *best = Some(Candidate { setting, error });
        }
    }
}

fn best_unmodulated(clock_hz: u32, baud_rate: u32) -> Option<Candidate> {
    let mut best = None;
    for divisor in DIVISORS.iter() {
        let cycles = divisor.coefficient as u64 * baud_rate as u64;
        let below = clock_hz as u64 / cycles;
        // Out of range dividers are pulled to the nearest end, which is the
        // closest this divisor gets.
        for divider in [below, below + 1] {
            let divider = divider.clamp(1, DIVIDER_MAX);
            let error = error_x1000(
                clock_hz,
                baud_rate,
                divisor.coefficient,
                divider,
                DUTY_FULL,
            );
            Candidate::offer(&mut best, divisor.setting(divider, None), error);
        }
    }
    best
}

fn best_modulated(clock_hz: u32, baud_rate: u32) -> Option<Candidate> {
    let mut best = None;
    for divisor in DIVISORS.iter() {
        let cycles = divisor.coefficient as u64 * baud_rate as u64;
        // Dividers for which some duty in [128, 256) lands on the rate, widened
        // by one on each side for a duty pinned at either end.
        let first = (clock_hz as u64).div_ceil(2 * cycles).saturating_sub(1);
        let last = clock_hz as u64 / cycles + 1;
        let first = first.clamp(1, DIVIDER_MAX);
        let last = last.clamp(first, DIVIDER_MAX);
        for divider in first..=last {
            let below = 256 * cycles * divider / clock_hz as u64;
            for duty in [below, below + 1] {
                let duty = duty.clamp(DUTY_MIN as u64, DUTY_MAX as u64) as u32;
                let error = error_x1000(clock_hz, baud_rate, divisor.coefficient, divider, duty);
                Candidate::offer(&mut best, divisor.setting(divider, Some(duty)), error);
            }
        }
    }
    best
}

/// Find the bit-rate generator setting for `baud_rate` from a peripheral
/// clock of `clock_hz`.
///
/// Settings without modulation are preferred: the smallest error wins, ties
/// going to the smaller coefficient. If that error exceeds `max_error_x1000`
/// and `modulation` is allowed, the modulated settings are ranked the same
/// way.
///
/// Returns `INVAL` for a zero clock or rate, a tolerance of 100% or more, or
/// when no setting meets the tolerance.
pub fn calculate(
    clock_hz: u32,
    baud_rate: u32,
    modulation: bool,
    max_error_x1000: u32,
) -> Result<BaudSetting, ErrorCode> {
    if clock_hz == 0 || baud_rate == 0 || max_error_x1000 as u128 >= ERROR_SCALE {
        return Err(ErrorCode::INVAL);
    }

    if let Some(best) = best_unmodulated(clock_hz, baud_rate) {
        if best.error <= max_error_x1000 {
            return Ok(best.setting);
        }
    }

    if modulation {
        if let Some(best) = best_modulated(clock_hz, baud_rate) {
            if best.error <= max_error_x1000 {
                return Ok(best.setting);
            }
        }
    }

    Err(ErrorCode::INVAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PCLK_48M: u32 = 48_000_000;

    #[test]
    fn divisor_table_is_ascending() {
        let coefficients: std::vec::Vec<u32> = DIVISORS.iter().map(|d| d.coefficient).collect();
        assert_eq!(
            coefficients,
            [6, 8, 16, 24, 32, 64, 96, 128, 256, 384, 512, 1024, 2048]
        );
    }

    #[test]
    fn common_rate_without_modulation() {
        let setting = calculate(PCLK_48M, 9600, false, 5000).unwrap();

        assert!(!setting.bgdm());
        assert!(!setting.abcs());
        assert!(setting.abcse());
        assert_eq!(setting.cks(), 1);
        assert_eq!(setting.brr(), 207);
        assert!(!setting.brme());
        assert_eq!(setting.coefficient(), Some(24));
        assert_eq!(setting.bit_rate_error(PCLK_48M, 9600), Some(160));
        assert_eq!(u32::from(setting), 0x0010_CF40);
    }

    #[test]
    fn equal_error_prefers_smaller_coefficient() {
        // 8 * 130 and 16 * 65 both divide 120 MHz to the same rate.
        let setting = calculate(120_000_000, 115_200, false, 1000).unwrap();

        assert!(setting.bgdm());
        assert!(setting.abcs());
        assert_eq!(setting.cks(), 0);
        assert_eq!(setting.brr(), 129);
        assert_eq!(setting.bit_rate_error(120_000_000, 115_200), Some(160));
    }

    #[test]
    fn modulation_only_used_when_needed() {
        let setting = calculate(PCLK_48M, 9600, true, 5000).unwrap();
        assert!(!setting.brme());

        assert_eq!(calculate(PCLK_48M, 9600, false, 100), Err(ErrorCode::INVAL));

        let modulated = calculate(PCLK_48M, 9600, true, 100).unwrap();
        assert!(modulated.brme());
        assert!(modulated.mddr() >= 128);
        assert!(modulated.is_valid());
        assert!(modulated.bit_rate_error(PCLK_48M, 9600).unwrap() <= 100);
    }

    #[test]
    fn results_meet_tolerance() {
        for rate in [
            1200, 2400, 4800, 9600, 19200, 38400, 57600, 115_200, 230_400, 460_800, 921_600,
        ] {
            let setting = calculate(PCLK_48M, rate, false, 5000).unwrap();
            assert!(setting.is_valid());
            assert!(setting.bit_rate_error(PCLK_48M, rate).unwrap() <= 5000);
        }
    }

    /// Smallest error any setting reaches, searched exhaustively.
    fn exhaustive_error(clock_hz: u32, baud_rate: u32, modulation: bool) -> u32 {
        let duties = if modulation {
            DUTY_MIN..=DUTY_MAX
        } else {
            DUTY_FULL..=DUTY_FULL
        };
        let mut best = u32::MAX;
        for divisor in DIVISORS.iter() {
            for divider in 1..=DIVIDER_MAX {
                for duty in duties.clone() {
                    let error =
                        error_x1000(clock_hz, baud_rate, divisor.coefficient, divider, duty);
                    best = best.min(error);
                }
            }
        }
        best
    }

    #[test]
    fn lowest_divider_range_uses_pinned_duty() {
        // Reached only with BRR = 255 and a duty of 128.
        let setting = calculate(120_000_000, 110, true, 5000).unwrap();

        assert!(setting.brme());
        assert_eq!(setting.brr(), 255);
        assert_eq!(setting.mddr(), 128);
        assert_eq!(setting.coefficient(), Some(2048));
        assert_eq!(setting.bit_rate_error(120_000_000, 110), Some(4037));
        assert_eq!(calculate(120_000_000, 110, false, 5000), Err(ErrorCode::INVAL));
    }

    #[test]
    fn matches_exhaustive_search() {
        for clock_hz in [8_000_000, 32_000_000, 48_000_000, 120_000_000] {
            let rates = [
                20,
                50,
                110,
                300,
                9600,
                115_200,
                clock_hz / 2000,
                clock_hz / 9,
                clock_hz / 6,
                clock_hz / 5,
            ];
            for rate in rates {
                let plain = exhaustive_error(clock_hz, rate, false);
                let modulated = exhaustive_error(clock_hz, rate, true);

                for tolerance in [100, 1000, 5000] {
                    for modulation in [false, true] {
                        let result = calculate(clock_hz, rate, modulation, tolerance);
                        if plain <= tolerance {
                            let setting = result.unwrap();
                            assert!(!setting.brme());
                            assert_eq!(setting.bit_rate_error(clock_hz, rate), Some(plain));
                        } else if modulation && modulated <= tolerance {
                            let setting = result.unwrap();
                            assert!(setting.brme());
                            assert!(setting.is_valid());
                            assert_eq!(setting.bit_rate_error(clock_hz, rate), Some(modulated));
                        } else {
                            assert_eq!(result, Err(ErrorCode::INVAL), "{} {}", clock_hz, rate);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn unreachable_rates_are_rejected() {
        assert_eq!(
            calculate(PCLK_48M, 10_000_000, true, 5000),
            Err(ErrorCode::INVAL)
        );
        assert_eq!(calculate(PCLK_48M, 10, true, 5000), Err(ErrorCode::INVAL));
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert_eq!(calculate(PCLK_48M, 0, false, 5000), Err(ErrorCode::INVAL));
        assert_eq!(calculate(0, 9600, false, 5000), Err(ErrorCode::INVAL));
        assert_eq!(
            calculate(PCLK_48M, 9600, false, 100_000),
            Err(ErrorCode::INVAL)
        );
    }

    #[test]
    fn raw_values_are_checked() {
        let setting = calculate(PCLK_48M, 9600, false, 5000).unwrap();
        assert_eq!(BaudSetting::from(u32::from(setting)), setting);

        // Reserved bit 0.
        assert!(!BaudSetting::from(0x0010_CF41).is_valid());
        // Modulation with a duty below 50%.
        assert!(!BaudSetting::from(0x7F01_CF40).is_valid());
        // Extended base clock together with double-speed mode.
        assert!(!BaudSetting::from(0x0010_CF50).is_valid());
        assert_eq!(BaudSetting::from(0x0010_CF50).bit_rate(PCLK_48M), None);
        assert_eq!(setting.bit_rate(PCLK_48M), Some(9615));
    }
}
