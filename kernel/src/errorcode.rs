// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Standard error enum for invoking operations

/// Standard errors in Tock.
///
/// Operations report success through `Ok` and carry one of these values in
/// `Err`. Drivers that accept a buffer hand it back alongside the error, so
/// a failed call never leaks the caller's memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum ErrorCode {
    /// Generic failure condition
    FAIL = 1,
    /// Underlying system is busy; retry
    BUSY = 2,
    /// The state requested is already set
    ALREADY = 3,
    /// The component is powered down
    OFF = 4,
    /// Reservation required before use
    RESERVE = 5,
    /// An invalid parameter was passed
    INVAL = 6,
    /// Parameter passed was too large
    SIZE = 7,
    /// Operation canceled by a call
    CANCEL = 8,
    /// Memory required not available
    NOMEM = 9,
    /// Operation or command is unsupported
    NOSUPPORT = 10,
    /// Device does not exist
    NODEVICE = 11,
    /// Device is not physically installed
    UNINSTALLED = 12,
    /// Packet transmission not acknowledged
    NOACK = 13,
}

impl From<ErrorCode> for usize {
    fn from(err: ErrorCode) -> usize {
        err as usize
    }
}

impl TryFrom<usize> for ErrorCode {
    type Error = ();

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ErrorCode::FAIL),
            2 => Ok(ErrorCode::BUSY),
            3 => Ok(ErrorCode::ALREADY),
            4 => Ok(ErrorCode::OFF),
            5 => Ok(ErrorCode::RESERVE),
            6 => Ok(ErrorCode::INVAL),
            7 => Ok(ErrorCode::SIZE),
            8 => Ok(ErrorCode::CANCEL),
            9 => Ok(ErrorCode::NOMEM),
            10 => Ok(ErrorCode::NOSUPPORT),
            11 => Ok(ErrorCode::NODEVICE),
            12 => Ok(ErrorCode::UNINSTALLED),
            13 => Ok(ErrorCode::NOACK),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;

    #[test]
    fn usize_conversion_is_reversible() {
        for code in [ErrorCode::OFF, ErrorCode::INVAL, ErrorCode::NOSUPPORT] {
            let raw: usize = code.into();
            assert_eq!(ErrorCode::try_from(raw), Ok(code));
        }
        assert_eq!(ErrorCode::try_from(0), Err(()));
        assert_eq!(ErrorCode::try_from(14), Err(()));
    }
}
