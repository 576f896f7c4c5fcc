// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! OptionalCell convenience type

use core::cell::Cell;

/// `OptionalCell` is a `Cell` that wraps an `Option`. This is helper type
/// that makes keeping types that can be `None` a little cleaner.
pub struct OptionalCell<T: Copy> {
    value: Cell<Option<T>>,
}

impl<T: Copy> OptionalCell<T> {
    /// Create an empty `OptionalCell` (contains just `None`).
    pub const fn empty() -> OptionalCell<T> {
        OptionalCell {
            value: Cell::new(None),
        }
    }

    /// Update the stored value.
    pub fn set(&self, val: T) {
        self.value.set(Some(val));
    }

    /// Insert the value of the supplied `Option`, or `None` if the supplied
    /// `Option` is `None`.
    pub fn insert(&self, opt: Option<T>) {
        self.value.set(opt);
    }

    /// Reset the stored value to `None`.
    pub fn clear(&self) {
        self.value.set(None);
    }

    /// Returns the contained value, leaving the cell untouched.
    pub fn get(&self) -> Option<T> {
        self.value.get()
    }

    /// Moves the value out, leaving `None` behind.
    pub fn take(&self) -> Option<T> {
        self.value.take()
    }

    // Note: Explicitly do not support unwrap, as we do not to encourage
    // panic'ing in the Tock kernel.

    /// Call a closure on the value if the value exists.
    pub fn map<F, R>(&self, closure: F) -> Option<R>
    where
        F: FnOnce(T) -> R,
    {
        self.value.get().map(closure)
    }

    /// Call a closure on the value if the value exists, or return the
    /// default if the value is `None`.
    pub fn map_or<F, R>(&self, default: R, closure: F) -> R
    where
        F: FnOnce(T) -> R,
    {
        self.value.get().map_or(default, closure)
    }
}

#[cfg(test)]
mod tests {
    use super::OptionalCell;

    #[test]
    fn take_leaves_cell_empty() {
        let cell = OptionalCell::empty();
        cell.set(3u8);
        assert_eq!(cell.get(), Some(3));
        assert_eq!(cell.take(), Some(3));
        assert_eq!(cell.get(), None);
    }

    #[test]
    fn insert_none_clears() {
        let cell = OptionalCell::empty();
        cell.insert(Some(9u32));
        assert_eq!(cell.map_or(0, |v| v + 1), 10);
        cell.insert(None);
        assert_eq!(cell.map(|v| v + 1), None);
        cell.set(2);
        cell.clear();
        assert_eq!(cell.map_or(1, |v| v), 1);
    }
}
