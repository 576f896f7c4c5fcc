// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Support for in-kernel debugging.
//!
//! The `debug!` macro formats its arguments and hands the bytes to whatever
//! [`IoWrite`] sink the board registered with [`set_debug_writer`]. Until a
//! writer is registered, messages are discarded.
//!
//! ```ignore
//! use kernel::debug;
//!
//! debug!("Yes the code gets here with value {}", i);
//! ```

use core::fmt::{write, Arguments, Result, Write};
use core::ptr::addr_of;

/// A raw, synchronous byte sink such as a polled console UART or a semihosting
/// channel.
pub trait IoWrite {
    /// Write as many bytes of `buf` as possible and return the count written.
    fn write(&self, buf: &[u8]) -> usize;
}

static mut DEBUG_WRITER: Option<&'static dyn IoWrite> = None;

/// Register the sink used by `debug!`.
///
/// # Safety
///
/// Must be called before interrupts are enabled, as the writer is stored in a
/// global without synchronization.
pub unsafe fn set_debug_writer(writer: &'static dyn IoWrite) {
    DEBUG_WRITER = Some(writer);
}

fn debug_writer() -> Option<&'static dyn IoWrite> {
    // Only read here, and only written before interrupts run.
    unsafe { *addr_of!(DEBUG_WRITER) }
}

struct DebugWriter(&'static dyn IoWrite);

impl Write for DebugWriter {
    fn write_str(&mut self, s: &str) -> Result {
        let mut bytes = s.as_bytes();
        while !bytes.is_empty() {
            let written = self.0.write(bytes);
            if written == 0 {
                return Err(core::fmt::Error);
            }
            bytes = &bytes[written.min(bytes.len())..];
        }
        Ok(())
    }
}

/// Format `args` followed by a line ending to the registered writer.
pub fn debug_println(args: Arguments) {
    if let Some(writer) = debug_writer() {
        let mut writer = DebugWriter(writer);
        let _ = write(&mut writer, args);
        let _ = writer.write_str("\r\n");
    }
}

/// In-kernel `println()` debugging.
#[macro_export]
macro_rules! debug {
    () => ({
        // An empty debug!() prints a blank line.
        $crate::debug!("")
    });
    ($msg:expr $(,)?) => ({
        $crate::debug::debug_println(format_args!("{}", $msg))
    });
    ($fmt:expr, $($arg:tt)+) => ({
        $crate::debug::debug_println(format_args!($fmt, $($arg)+))
    });
}

#[cfg(test)]
mod tests {
    use super::{set_debug_writer, IoWrite};
    use core::cell::RefCell;
    use std::boxed::Box;
    use std::vec::Vec;

    // Accepts at most four bytes per call so the retry loop is exercised.
    struct Capture {
        out: RefCell<Vec<u8>>,
    }

    impl IoWrite for Capture {
        fn write(&self, buf: &[u8]) -> usize {
            let n = buf.len().min(4);
            self.out.borrow_mut().extend_from_slice(&buf[..n]);
            n
        }
    }

    #[test]
    fn debug_macro_reaches_writer() {
        let capture: &'static Capture = Box::leak(Box::new(Capture {
            out: RefCell::new(Vec::new()),
        }));
        unsafe { set_debug_writer(capture) };

        debug!("channel {} sent {} bytes", 3, 40);

        assert_eq!(
            capture.out.borrow().as_slice(),
            b"channel 3 sent 40 bytes\r\n".as_slice()
        );
    }
}
