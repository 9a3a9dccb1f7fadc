//! The shared base container: owns a value buffer and a validity bitmap,
//! and implements allocation, growth, transfer, split-and-transfer, and
//! lifecycle for every typed façade.
//!
//! One non-generic, width-tagged struct rather than one monomorphized base
//! per element width: `Bit`'s bit-packed value buffer and every other
//! roster type's byte-aligned value buffer don't share a single
//! `bytemuck::Pod` bound cleanly, so dispatch on `bit_width` collapses the
//! two shapes into one implementation instead of duplicating it.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::bitmap;
use crate::buffer::{Allocator, ByteBuffer, SystemAllocator};
use crate::errors::{Error, Result};

/// Hard allocation cap, in bytes, for either buffer. `2^31 - 8`, the
/// default used throughout this layer.
pub const MAX_ALLOCATION_BYTES: usize = (1usize << 31) - 8;

/// Default element capacity used by the no-argument `allocate_new()`.
pub const DEFAULT_INITIAL_CAPACITY: usize = 4096;

/// Compute `(validity_bytes, value_bytes)` for `n` elements of `bit_width`
/// bits each.
fn byte_sizes(bit_width: usize, n: usize) -> (usize, usize) {
    let validity_bytes = bitmap::size_from_count(n);
    let value_bytes =
        if bit_width >= 8 { n * (bit_width / 8) } else { bitmap::size_from_count(n) };
    (validity_bytes, value_bytes)
}

fn check_oversized(validity_bytes: usize, value_bytes: usize) -> Result<()> {
    let requested = validity_bytes.max(value_bytes);
    if requested > MAX_ALLOCATION_BYTES {
        return Err(Error::OversizedAllocation { requested, max: MAX_ALLOCATION_BYTES });
    }
    Ok(())
}

/// The base container. `bit_width` is 1 (boolean/bit-packed) or a multiple
/// of 8 (byte-aligned).
pub struct FixedWidthBase {
    bit_width: usize,
    value_count: usize,
    capacity: usize,
    validity: ByteBuffer,
    values: ByteBuffer,
    initial_capacity: usize,
    allocator: Arc<dyn Allocator>,
}

impl FixedWidthBase {
    /// A freshly created, empty (unallocated) container for elements of
    /// `bit_width` bits, using the system allocator.
    #[must_use]
    pub fn new(bit_width: usize) -> Self {
        Self::with_allocator(bit_width, Arc::new(SystemAllocator))
    }

    /// As [`Self::new`], but with a caller-supplied allocator.
    #[must_use]
    pub fn with_allocator(bit_width: usize, allocator: Arc<dyn Allocator>) -> Self {
        Self {
            bit_width,
            value_count: 0,
            capacity: 0,
            validity: ByteBuffer::empty(),
            values: ByteBuffer::empty(),
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            allocator,
        }
    }

    #[must_use]
    pub fn bit_width(&self) -> usize {
        self.bit_width
    }

    #[must_use]
    pub fn value_count(&self) -> usize {
        self.value_count
    }

    #[must_use]
    pub fn validity(&self) -> &ByteBuffer {
        &self.validity
    }

    #[must_use]
    pub fn values(&self) -> &ByteBuffer {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut ByteBuffer {
        &mut self.values
    }

    pub(crate) fn validity_mut(&mut self) -> &mut ByteBuffer {
        &mut self.validity
    }

    /// Record the capacity `allocate_new()` (no-argument form) should use.
    /// Validated but not allocated here.
    ///
    /// # Errors
    /// [`Error::OversizedAllocation`] if either resulting buffer would
    /// exceed [`MAX_ALLOCATION_BYTES`].
    pub fn set_initial_capacity(&mut self, n: usize) -> Result<()> {
        let (validity_bytes, value_bytes) = byte_sizes(self.bit_width, n);
        check_oversized(validity_bytes, value_bytes)?;
        self.initial_capacity = n;
        Ok(())
    }

    /// Allocate both buffers at the capacity set by
    /// [`Self::set_initial_capacity`] (default [`DEFAULT_INITIAL_CAPACITY`]).
    ///
    /// # Errors
    /// [`Error::OversizedAllocation`] / [`Error::OutOfMemory`].
    pub fn allocate_new(&mut self) -> Result<()> {
        self.allocate_new_with_capacity(self.initial_capacity)
    }

    /// Allocate both buffers at exactly `n` elements of capacity.
    ///
    /// # Errors
    /// [`Error::OversizedAllocation`] / [`Error::OutOfMemory`].
    #[instrument(skip(self), fields(bit_width = self.bit_width))]
    pub fn allocate_new_with_capacity(&mut self, n: usize) -> Result<()> {
        let (validity_bytes, value_bytes) = byte_sizes(self.bit_width, n);
        check_oversized(validity_bytes, value_bytes)?;

        let validity = self.allocator.allocate(validity_bytes)?;
        let values = match self.allocator.allocate(value_bytes) {
            Ok(v) => v,
            Err(e) => {
                warn!(value_bytes, "allocator refused value buffer, releasing validity buffer");
                drop(validity);
                return Err(e);
            }
        };
        debug!(n, validity_bytes, value_bytes, "allocated");

        self.validity = validity;
        self.values = values;
        self.capacity = n;
        self.value_count = 0;
        Ok(())
    }

    /// Doubling growth: a new value buffer of twice the byte capacity and
    /// a new validity buffer of twice the bit capacity, old contents
    /// copied into the low half, old buffers released.
    ///
    /// # Errors
    /// [`Error::OversizedAllocation`] if the doubled size exceeds the cap;
    /// [`Error::OutOfMemory`] if the allocator refuses.
    #[instrument(skip(self), fields(bit_width = self.bit_width, old_capacity = self.capacity))]
    pub fn re_alloc(&mut self) -> Result<()> {
        let new_capacity = if self.capacity == 0 { self.initial_capacity.max(1) } else { self.capacity * 2 };
        let (validity_bytes, value_bytes) = byte_sizes(self.bit_width, new_capacity);
        if let Err(e) = check_oversized(validity_bytes, value_bytes) {
            warn!(new_capacity, "doubling growth exceeds allocation cap");
            return Err(e);
        }

        let mut new_validity = self.allocator.allocate(validity_bytes)?;
        let mut new_values = match self.allocator.allocate(value_bytes) {
            Ok(v) => v,
            Err(e) => {
                drop(new_validity);
                return Err(e);
            }
        };

        new_validity.write_bytes(0, self.validity.as_slice());
        new_values.write_bytes(0, self.values.as_slice());

        self.validity = new_validity;
        self.values = new_values;
        self.capacity = new_capacity;
        debug!(new_capacity, "grew");
        Ok(())
    }

    /// Grow until `i < capacity()`. The gate that makes every `*Safe`
    /// setter total over non-negative indices.
    ///
    /// # Errors
    /// Propagates [`Self::re_alloc`]'s failure modes.
    pub fn handle_safe(&mut self, i: usize) -> Result<()> {
        while i >= self.capacity {
            self.re_alloc()?;
        }
        Ok(())
    }

    fn ensure_capacity_at_least(&mut self, n: usize) -> Result<()> {
        while self.capacity < n {
            self.re_alloc()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Addressable element slots given current buffer sizes.
    #[must_use]
    pub fn value_capacity(&self) -> usize {
        if self.bit_width == 1 {
            self.validity.capacity() * 8
        } else {
            (self.validity.capacity() * 8).min(self.values.capacity() * 8 / self.bit_width)
        }
    }

    /// Fix the logical length at `n`, growing if necessary, and zero the
    /// validity bits in `[n, next byte boundary)` to normalize the tail.
    ///
    /// # Errors
    /// Propagates [`Self::re_alloc`]'s failure modes.
    pub fn set_value_count(&mut self, n: usize) -> Result<()> {
        self.ensure_capacity_at_least(n)?;
        self.value_count = n;

        let boundary = bitmap::size_from_count(n) * 8;
        if boundary > n {
            self.validity.with_mut(|buf| {
                for i in n..boundary {
                    bitmap::set_bit(buf, i, 0);
                }
            });
        }
        Ok(())
    }

    /// `1` if element `i` is non-null; reading beyond `value_count` is
    /// defined as null. This is the public `isSet` query (spec §4.2): it
    /// is gated on `value_count`, not on what's actually allocated.
    #[must_use]
    pub fn is_set(&self, i: usize) -> u8 {
        if i < self.value_count { bitmap::get_bit(self.validity.as_slice(), i) } else { 0 }
    }

    /// Raw validity bit at `i`, bounded only by `capacity`, not
    /// `value_count`. A value written via `set`/`set_safe` at an index
    /// `i >= value_count` (before `set_value_count` catches up) is still
    /// readable through `get`/`get_object`; that path must check this,
    /// not `is_set`, or it would report `NullValue` for a slot that was
    /// just written (spec §4.3, invariants 1 and 5).
    #[must_use]
    pub fn bit_set(&self, i: usize) -> u8 {
        if i < self.capacity { bitmap::get_bit(self.validity.as_slice(), i) } else { 0 }
    }

    #[must_use]
    pub fn null_count(&self) -> usize {
        self.value_count - bitmap::pop_count(self.validity.as_slice(), bitmap::size_from_count(self.value_count))
    }

    /// Release both buffers and return to the empty state. Idempotent.
    pub fn clear(&mut self) {
        if self.capacity > 0 {
            debug!(bit_width = self.bit_width, capacity = self.capacity, "clearing");
        }
        self.validity = ByteBuffer::empty();
        self.values = ByteBuffer::empty();
        self.value_count = 0;
        self.capacity = 0;
    }

    /// Move both buffers from `self` to `target`, which is cleared first.
    /// `self` becomes empty.
    pub fn transfer_to(&mut self, target: &mut Self) {
        target.clear();
        target.bit_width = self.bit_width;
        target.validity = std::mem::replace(&mut self.validity, ByteBuffer::empty());
        target.values = std::mem::replace(&mut self.values, ByteBuffer::empty());
        target.capacity = self.capacity;
        target.value_count = self.value_count;
        target.allocator = Arc::clone(&self.allocator);

        self.capacity = 0;
        self.value_count = 0;
    }

    /// Produce in `target` a view-or-copy of `[start, start+length)`.
    /// `target` is cleared first. Precondition: `start + length <=
    /// value_count()`.
    ///
    /// # Errors
    /// [`Error::IndexOutOfBounds`] if the range exceeds `value_count()`.
    /// Propagates growth failures from the final `set_value_count`.
    pub fn split_and_transfer_to(&self, start: usize, length: usize, target: &mut Self) -> Result<()> {
        if start + length > self.value_count {
            return Err(Error::IndexOutOfBounds { index: start + length, capacity: self.value_count });
        }
        target.clear();
        target.bit_width = self.bit_width;
        target.allocator = Arc::clone(&self.allocator);

        if self.bit_width >= 8 {
            let elem_bytes = self.bit_width / 8;
            target.values = self.values.slice(start * elem_bytes..(start + length) * elem_bytes);
        } else if start % 8 == 0 {
            let byte_start = start / 8;
            let byte_len = bitmap::size_from_count(length);
            target.values = self.values.slice(byte_start..byte_start + byte_len);
        } else {
            target.values = ByteBuffer::from_vec(bitmap::slice_bits(self.values.as_slice(), start, length));
        }

        if start % 8 == 0 {
            let byte_start = start / 8;
            let byte_len = bitmap::size_from_count(length);
            target.validity = self.validity.slice(byte_start..byte_start + byte_len);
        } else {
            target.validity = ByteBuffer::from_vec(bitmap::slice_bits(self.validity.as_slice(), start, length));
        }

        target.capacity = target.value_capacity();
        target.set_value_count(length)
    }

    /// If source bit `j` is 1, copy element `j` of `self` into slot `i` of
    /// `dst` and set `dst`'s validity bit; otherwise leave `dst`
    /// unchanged (the destination validity bit is **not** cleared in the
    /// null case, callers reusing slots must `set_null` first).
    ///
    /// No growth: `i` must already be `< dst.capacity()`.
    pub fn copy_from(&self, j: usize, dst: &mut Self, i: usize) {
        if bitmap::get_bit(self.validity.as_slice(), j) != 1 {
            return;
        }

        if self.bit_width >= 8 {
            let elem_bytes = self.bit_width / 8;
            let src_bytes = self.values.get_bytes(j * elem_bytes, elem_bytes).to_vec();
            dst.values.write_bytes(i * elem_bytes, &src_bytes);
        } else {
            let bit = bitmap::get_bit(self.values.as_slice(), j);
            dst.values.with_mut(|buf| bitmap::set_bit(buf, i, bit));
        }
        dst.validity.with_mut(|buf| bitmap::set_bit_to_one(buf, i));
    }

    /// [`Self::handle_safe`] on `dst` at `i`, then [`Self::copy_from`].
    ///
    /// # Errors
    /// Propagates [`Self::handle_safe`]'s failure modes.
    pub fn copy_from_safe(&self, j: usize, dst: &mut Self, i: usize) -> Result<()> {
        dst.handle_safe(i)?;
        self.copy_from(j, dst, i);
        Ok(())
    }

    /// `⌈value_count/8⌉ + value_count·bit_width/8` for `bit_width >= 8`;
    /// `2·⌈value_count/8⌉` for `bit_width == 1`.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size_for(self.value_count)
    }

    #[must_use]
    pub fn buffer_size_for(&self, count: usize) -> usize {
        let (validity_bytes, value_bytes) = byte_sizes(self.bit_width, count);
        validity_bytes + value_bytes
    }

    /// Ordered `(validity, values)` pair, cheap clones (refcount bump), for
    /// zero-copy IPC-style consumption by a higher layer.
    #[must_use]
    pub fn field_buffers(&self) -> (ByteBuffer, ByteBuffer) {
        (self.validity.retain(), self.values.retain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_new_zero_fills_and_resets_value_count() {
        let mut base = FixedWidthBase::new(32);
        base.allocate_new_with_capacity(16).unwrap();
        assert_eq!(base.value_count(), 0);
        assert!(base.value_capacity() >= 16);
        assert!(base.validity().as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn re_alloc_doubles_and_preserves_low_half() {
        let mut base = FixedWidthBase::new(32);
        base.allocate_new_with_capacity(4).unwrap();
        base.values_mut().write_bytes(0, &42i32.to_le_bytes());
        base.validity_mut().with_mut(|buf| bitmap::set_bit_to_one(buf, 0));
        let old_capacity = base.capacity();

        base.re_alloc().unwrap();

        assert_eq!(base.capacity(), old_capacity * 2);
        assert_eq!(i32::from_le_bytes(base.values().get_bytes(0, 4).try_into().unwrap()), 42);
        assert_eq!(base.is_set(0), 0); // value_count is still 0, is_set gated on value_count
        assert_eq!(bitmap::get_bit(base.validity().as_slice(), 0), 1);
    }

    #[test]
    fn handle_safe_grows_until_index_fits() {
        let mut base = FixedWidthBase::new(8);
        base.allocate_new_with_capacity(4).unwrap();
        base.handle_safe(100).unwrap();
        assert!(base.capacity() > 100);
    }

    #[test]
    fn set_value_count_zeroes_tail_bits() {
        let mut base = FixedWidthBase::new(8);
        base.allocate_new_with_capacity(16).unwrap();
        base.validity_mut().with_mut(|buf| buf.fill(0xFF));
        base.set_value_count(5).unwrap();
        for i in 0..5 {
            assert_eq!(bitmap::get_bit(base.validity().as_slice(), i), 1);
        }
        for i in 5..8 {
            assert_eq!(bitmap::get_bit(base.validity().as_slice(), i), 0);
        }
    }

    #[test]
    fn transfer_to_empties_source() {
        let mut src = FixedWidthBase::new(32);
        src.allocate_new_with_capacity(8).unwrap();
        src.set_value_count(8).unwrap();
        let mut dst = FixedWidthBase::new(32);

        src.transfer_to(&mut dst);

        assert_eq!(src.value_capacity(), 0);
        assert_eq!(src.value_count(), 0);
        assert_eq!(dst.value_count(), 8);
    }

    #[test]
    fn split_and_transfer_aligned_shares_value_storage() {
        let mut src = FixedWidthBase::new(32);
        src.allocate_new_with_capacity(16).unwrap();
        for i in 0..16 {
            src.values_mut().write_bytes(i * 4, &(i as i32).to_le_bytes());
        }
        src.set_value_count(16).unwrap();
        src.validity_mut().with_mut(|buf| buf.fill(0xFF));

        let mut target = FixedWidthBase::new(32);
        src.split_and_transfer_to(8, 4, &mut target).unwrap();

        assert_eq!(target.value_count(), 4);
        for k in 0..4 {
            let v = i32::from_le_bytes(target.values().get_bytes(k * 4, 4).try_into().unwrap());
            assert_eq!(v, (8 + k) as i32);
        }
    }

    #[test]
    fn split_and_transfer_unaligned_produces_fresh_bit_buffer() {
        let mut src = FixedWidthBase::new(1);
        src.allocate_new_with_capacity(32).unwrap();
        src.values_mut().with_mut(|buf| {
            for i in 0..17 {
                bitmap::set_bit(buf, i, (i % 2) as u8);
            }
        });
        src.validity_mut().with_mut(|buf| buf.fill(0xFF));
        src.set_value_count(17).unwrap();

        let mut target = FixedWidthBase::new(1);
        src.split_and_transfer_to(3, 9, &mut target).unwrap();

        assert_eq!(target.value_count(), 9);
        for k in 0..9 {
            let expected = bitmap::get_bit(src.values().as_slice(), 3 + k);
            let actual = bitmap::get_bit(target.values().as_slice(), k);
            assert_eq!(actual, expected, "bit {k} mismatch");
        }
    }

    #[test]
    fn copy_from_leaves_destination_unchanged_when_source_null() {
        let mut src = FixedWidthBase::new(32);
        src.allocate_new_with_capacity(4).unwrap();
        src.set_value_count(4).unwrap(); // all bits null

        let mut dst = FixedWidthBase::new(32);
        dst.allocate_new_with_capacity(4).unwrap();
        dst.validity_mut().with_mut(|buf| bitmap::set_bit_to_one(buf, 0));
        dst.set_value_count(4).unwrap();

        src.copy_from(0, &mut dst, 0);

        assert_eq!(bitmap::get_bit(dst.validity().as_slice(), 0), 1);
    }

    #[test]
    fn buffer_size_law_matches_spec_formula() {
        let mut base = FixedWidthBase::new(32);
        base.allocate_new_with_capacity(10).unwrap();
        base.set_value_count(10).unwrap();
        assert_eq!(base.buffer_size(), bitmap::size_from_count(10) + 10 * 4);

        let mut bit_base = FixedWidthBase::new(1);
        bit_base.allocate_new_with_capacity(10).unwrap();
        bit_base.set_value_count(10).unwrap();
        assert_eq!(bit_base.buffer_size(), 2 * bitmap::size_from_count(10));
    }

    #[test]
    fn empty_vector_has_zero_buffer_size() {
        let base = FixedWidthBase::new(32);
        assert_eq!(base.buffer_size(), 0);
        assert_eq!(base.buffer_size_for(0), 0);
    }
}
