// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Tock specific `TakeCell` type for sharing references.

use core::cell::Cell;

/// A shared reference to a mutable reference.
///
/// A `TakeCell` wraps potential reference to mutable memory that may be
/// available at a given point. Rather than enforcing borrow rules at
/// compile-time, `TakeCell` enables multiple clients to hold references to it,
/// but ensures that only one referrer has access to the underlying mutable
/// reference at a time. Clients either move the memory out of the `TakeCell` or
/// operate on a borrow within a closure. Attempts to take the value from inside
/// a `TakeCell` may fail by returning `None`.
///
/// Drivers use it to hold a buffer lent to a hardware transfer: while the
/// buffer sits in the cell no one else can reach it, and completing or
/// aborting the transfer `take`s it back out.
pub struct TakeCell<'a, T: 'a + ?Sized> {
    val: Cell<Option<&'a mut T>>,
}

impl<'a, T: ?Sized> TakeCell<'a, T> {
    pub const fn empty() -> TakeCell<'a, T> {
        TakeCell {
            val: Cell::new(None),
        }
    }

    /// Takes the mutable reference out of the `TakeCell` leaving a `None` in
    /// its place. If the value has already been taken elsewhere (and not
    /// `replace`ed), the returned `Option` will be empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use tock_cells::take_cell::TakeCell;
    ///
    /// let mut value = 1234;
    /// let cell = TakeCell::empty();
    /// cell.replace(&mut value);
    /// let x = &cell;
    /// let y = &cell;
    ///
    /// x.take();
    /// assert_eq!(y.take(), None);
    /// ```
    pub fn take(&self) -> Option<&'a mut T> {
        self.val.replace(None)
    }

    /// Replaces the contents of the `TakeCell` with `val`. If the cell was not
    /// empty, the previous value is returned, otherwise `None` is returned.
    pub fn replace(&self, val: &'a mut T) -> Option<&'a mut T> {
        self.val.replace(Some(val))
    }

    /// Allows `closure` to borrow the contents of the `TakeCell` if it is not
    /// `take`n already, or returns `default`. The contents stay in the cell.
    pub fn map_or<F, R>(&self, default: R, closure: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let maybe_val = self.take();
        maybe_val.map_or(default, |val| {
            let res = closure(val);
            self.replace(val);
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::TakeCell;

    #[test]
    fn map_or_leaves_value_in_place() {
        let mut value = [1u8, 2, 3];
        let cell = TakeCell::empty();
        assert!(cell.replace(&mut value[..]).is_none());

        let sum = cell.map_or(0, |buf| {
            buf[0] = 10;
            buf.iter().map(|b| *b as u32).sum::<u32>()
        });

        assert_eq!(sum, 15);
        assert_eq!(cell.take().map(|buf| buf[0]), Some(10));
        assert!(cell.take().is_none());
    }

    #[test]
    fn map_or_on_empty_cell() {
        let cell: TakeCell<[u8]> = TakeCell::empty();
        assert_eq!(cell.map_or(7, |buf| buf.len()), 7);
    }
}
