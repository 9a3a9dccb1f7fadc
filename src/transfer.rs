//! Transfer operation: binds a source vector to a target of the same
//! concrete type and moves or shares buffer ownership between them.
//!
//! The source's inner dispatcher hard-codes source/target concrete types
//! at the call site; here the type is checked once, at
//! [`TransferPair::new`], by the Rust type system itself: `TransferPair<V>`
//! only compiles when both halves are the same `V`. `DecimalVector` is the
//! one façade that can't get this compile-time guarantee, since its
//! `(precision, scale)` is a runtime field, so it keeps its own
//! `Result`-returning transfer methods directly instead of implementing
//! [`Transferable`].

use crate::errors::Result;

/// Implemented by every façade except `DecimalVector` (see module docs).
/// A capability rather than a concrete pair type: construct once, reuse
/// for `transfer`/`splitAndTransfer`/`copyValueSafe`.
pub trait Transferable: Sized {
    /// Move buffer ownership from `self` to `target`. `self` becomes
    /// empty.
    ///
    /// # Errors
    /// Never fails for the façades that implement this trait; `Result`
    /// is kept for symmetry with the rest of the transfer surface.
    fn transfer_to(&mut self, target: &mut Self) -> Result<()>;

    /// # Errors
    /// Propagates the underlying façade's split/growth failures.
    fn split_and_transfer_to(&self, start: usize, length: usize, target: &mut Self) -> Result<()>;

    /// # Errors
    /// Propagates the underlying façade's growth failures.
    fn copy_value_safe(&self, from_idx: usize, target: &mut Self, to_idx: usize) -> Result<()>;
}

impl<T: crate::types::ScalarType> Transferable for crate::vector::FixedWidthVector<T> {
    fn transfer_to(&mut self, target: &mut Self) -> Result<()> {
        crate::vector::FixedWidthVector::transfer_to(self, target);
        Ok(())
    }

    fn split_and_transfer_to(&self, start: usize, length: usize, target: &mut Self) -> Result<()> {
        crate::vector::FixedWidthVector::split_and_transfer_to(self, start, length, target)
    }

    fn copy_value_safe(&self, from_idx: usize, target: &mut Self, to_idx: usize) -> Result<()> {
        crate::vector::FixedWidthVector::copy_from_safe(self, from_idx, target, to_idx)
    }
}

impl Transferable for crate::bit::BitVector {
    fn transfer_to(&mut self, target: &mut Self) -> Result<()> {
        crate::bit::BitVector::transfer_to(self, target);
        Ok(())
    }

    fn split_and_transfer_to(&self, start: usize, length: usize, target: &mut Self) -> Result<()> {
        crate::bit::BitVector::split_and_transfer_to(self, start, length, target)
    }

    fn copy_value_safe(&self, from_idx: usize, target: &mut Self, to_idx: usize) -> Result<()> {
        crate::bit::BitVector::copy_from_safe(self, from_idx, target, to_idx)
    }
}

/// Binds a source and a target of the same concrete façade type, checked
/// once at construction by the type system.
pub struct TransferPair<'a, V> {
    source: &'a mut V,
    target: &'a mut V,
}

impl<'a, V: Transferable> TransferPair<'a, V> {
    pub fn new(source: &'a mut V, target: &'a mut V) -> Self {
        Self { source, target }
    }

    /// # Errors
    /// Propagates [`Transferable::transfer_to`].
    pub fn transfer(&mut self) -> Result<()> {
        self.source.transfer_to(self.target)
    }

    /// # Errors
    /// Propagates [`Transferable::split_and_transfer_to`].
    pub fn split_and_transfer(&mut self, start: usize, length: usize) -> Result<()> {
        self.source.split_and_transfer_to(start, length, self.target)
    }

    /// # Errors
    /// Propagates [`Transferable::copy_value_safe`].
    pub fn copy_value_safe(&mut self, from_idx: usize, to_idx: usize) -> Result<()> {
        self.source.copy_value_safe(from_idx, self.target, to_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::FixedWidthVector;

    #[test]
    fn transfer_pair_moves_ownership() {
        let mut source: FixedWidthVector<i32> = FixedWidthVector::new();
        source.allocate_new().unwrap();
        source.set_safe(0, 42).unwrap();
        source.set_value_count(1).unwrap();

        let mut target: FixedWidthVector<i32> = FixedWidthVector::new();
        let mut pair = TransferPair::new(&mut source, &mut target);
        pair.transfer().unwrap();

        assert_eq!(source.value_capacity(), 0);
        assert_eq!(target.get(0).unwrap(), 42);
    }

    #[test]
    fn transfer_pair_split_and_transfer() {
        let mut source: FixedWidthVector<i32> = FixedWidthVector::new();
        source.allocate_new().unwrap();
        for i in 0..10 {
            source.set_safe(i, i as i32).unwrap();
        }
        source.set_value_count(10).unwrap();

        let mut target: FixedWidthVector<i32> = FixedWidthVector::new();
        let mut pair = TransferPair::new(&mut source, &mut target);
        pair.split_and_transfer(2, 3).unwrap();

        assert_eq!(target.value_count(), 3);
        assert_eq!(target.get(0).unwrap(), 2);
        assert_eq!(target.get(2).unwrap(), 4);
    }

    #[test]
    fn transfer_pair_copy_value_safe() {
        let mut source: FixedWidthVector<i32> = FixedWidthVector::new();
        source.allocate_new().unwrap();
        source.set_safe(0, 99).unwrap();
        source.set_value_count(1).unwrap();

        let mut target: FixedWidthVector<i32> = FixedWidthVector::new();
        target.allocate_new().unwrap();
        let mut pair = TransferPair::new(&mut source, &mut target);
        pair.copy_value_safe(0, 5).unwrap();

        assert_eq!(target.get(5).unwrap(), 99);
    }
}
