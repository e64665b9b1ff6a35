//! Packed bit storage.
//!
//! Used both as the validity mask of a column (1 = valid, 0 = null) and as
//! the value buffer of boolean columns. The LSB of byte 0 is element 0.

/// Growable packed bitmask.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bitmask {
    bits: Vec<u8>,
    len: usize,
}

impl Bitmask {
    /// Create an empty mask with room for `bits` elements.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bits: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    /// Append one bit.
    #[inline]
    pub fn push(&mut self, value: bool) {
        if self.len & 7 == 0 {
            self.bits.push(0);
        }
        if value {
            self.bits[self.len >> 3] |= 1 << (self.len & 7);
        }
        self.len += 1;
    }

    /// Read bit `idx`. Out-of-range reads return `false`.
    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        if idx >= self.len {
            return false;
        }
        self.bits[idx >> 3] & (1 << (idx & 7)) != 0
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the mask holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        // trailing bits are always zero
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Number of cleared bits.
    pub fn count_zeros(&self) -> usize {
        self.len - self.count_ones()
    }

    /// Whether every element is set.
    pub fn all_set(&self) -> bool {
        self.count_ones() == self.len
    }

    /// Packed byte size of the buffer.
    pub fn byte_len(&self) -> usize {
        self.bits.len()
    }
}
