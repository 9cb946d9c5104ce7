//! Bounds-checked reader over a received payload.

/// A read past the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Requested {requested} octets but only {remaining} remain")]
pub struct OutOfBounds {
    pub requested: usize,
    pub remaining: usize,
}

/// Stateful reader that advances only when a read succeeds.
pub struct Cursor<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor at the head of the buffer.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of octets not consumed yet.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Reads data of specified size and seeks the cursor.
    pub fn take(&mut self, length: usize) -> Result<&'a [u8], OutOfBounds> {
        let bytes = self
            .position
            .checked_add(length)
            .and_then(|end| self.buffer.get(self.position..end))
            .ok_or(OutOfBounds {
                requested: length,
                remaining: self.remaining(),
            })?;

        self.position += length;
        Ok(bytes)
    }

    /// Reads a fixed-size array and seeks the cursor.
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], OutOfBounds> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    /// Reads a next octet and seeks the cursor.
    pub fn read_u8(&mut self) -> Result<u8, OutOfBounds> {
        self.take_array::<1>().map(|[b]| b)
    }

    /// Reads a 3-octet little-endian integer, as the card encodes sizes and counts.
    pub fn read_u24_le(&mut self) -> Result<u32, OutOfBounds> {
        self.take_array::<3>()
            .map(|[b0, b1, b2]| u32::from_le_bytes([b0, b1, b2, 0]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, OutOfBounds> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub fn read_i32_le(&mut self) -> Result<i32, OutOfBounds> {
        self.take_array().map(i32::from_le_bytes)
    }
}
