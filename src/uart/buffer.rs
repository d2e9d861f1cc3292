// src/uart/buffer.rs

//! Fixed-capacity circular byte buffer
//!
//! Used to stage received bytes between the interrupt handler and the
//! application, and outgoing bytes between `write()` and the transmit FIFO.
//! The buffer itself is not synchronized; the driver confines mutation to
//! the interrupt handler or to mainline code holding a critical section.

use alloc::vec::Vec;
use core::fmt;

use super::error::{UartError, UartResult};

/// Ring buffer with independent read and write cursors.
///
/// One slot of the backing storage is always left unused so that
/// `read_pos == write_pos` unambiguously means "empty".
pub struct SerialBuffer {
    storage: Vec<u8>,
    read_pos: usize,
    write_pos: usize,
}

impl SerialBuffer {
    /// Allocate a buffer holding up to `capacity` bytes
    ///
    /// # Errors
    ///
    /// - `UartError::ZeroCapacity` if `capacity` is 0
    /// - `UartError::OutOfMemory` if the allocation fails
    pub fn new(capacity: usize) -> UartResult<Self> {
        Ok(Self {
            storage: allocate(capacity)?,
            read_pos: 0,
            write_pos: 0,
        })
    }

    /// Number of bytes this buffer can hold
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len() - 1
    }

    /// Bytes ready to be read
    #[inline]
    pub fn available(&self) -> usize {
        if self.write_pos >= self.read_pos {
            self.write_pos - self.read_pos
        } else {
            self.storage.len() - self.read_pos + self.write_pos
        }
    }

    /// Bytes that can still be written
    #[inline]
    pub fn free_space(&self) -> usize {
        self.capacity() - self.available()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read_pos == self.write_pos
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.wrap(self.write_pos + 1) == self.read_pos
    }

    /// Append one byte; returns `false` and drops it if the buffer is full
    pub fn write(&mut self, byte: u8) -> bool {
        let next = self.wrap(self.write_pos + 1);
        if next == self.read_pos {
            return false;
        }
        self.storage[self.write_pos] = byte;
        self.write_pos = next;
        true
    }

    /// Append as many bytes of `data` as fit, returning how many were taken
    pub fn write_slice(&mut self, data: &[u8]) -> usize {
        data.iter().take_while(|&&byte| self.write(byte)).count()
    }

    /// Remove and return the oldest byte
    pub fn read(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.storage[self.read_pos];
        self.read_pos = self.wrap(self.read_pos + 1);
        Some(byte)
    }

    /// Oldest byte, without removing it
    pub fn peek(&self) -> Option<u8> {
        (!self.is_empty()).then(|| self.storage[self.read_pos])
    }

    /// Most recently written byte, without removing it
    pub fn peek_last(&self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let last = if self.write_pos == 0 {
            self.storage.len() - 1
        } else {
            self.write_pos - 1
        };
        Some(self.storage[last])
    }

    /// Offset from the read cursor of the first occurrence of `byte`
    pub fn find(&self, byte: u8) -> Option<usize> {
        (0..self.available())
            .find(|&offset| self.storage[self.wrap(self.read_pos + offset)] == byte)
    }

    /// Discard all content and reset both cursors
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
    }

    /// Change the capacity, keeping buffered content in order.
    ///
    /// Returns the resulting capacity; a shrink below the bytes currently
    /// held is refused and leaves the buffer untouched.
    ///
    /// # Errors
    ///
    /// - `UartError::ZeroCapacity` if `new_capacity` is 0
    /// - `UartError::OutOfMemory` if the allocation fails
    pub fn resize(&mut self, new_capacity: usize) -> UartResult<usize> {
        if new_capacity == 0 {
            return Err(UartError::ZeroCapacity);
        }
        if new_capacity == self.capacity() || new_capacity < self.available() {
            return Ok(self.capacity());
        }

        let mut storage = allocate(new_capacity)?;
        let mut len = 0;
        while let Some(byte) = self.read() {
            storage[len] = byte;
            len += 1;
        }
        self.storage = storage;
        self.read_pos = 0;
        self.write_pos = len;
        Ok(self.capacity())
    }

    #[inline]
    fn wrap(&self, pos: usize) -> usize {
        pos % self.storage.len()
    }
}

impl fmt::Debug for SerialBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialBuffer")
            .field("capacity", &self.capacity())
            .field("available", &self.available())
            .finish()
    }
}

/// Zero-filled storage for `capacity` bytes plus the sentinel slot
fn allocate(capacity: usize) -> UartResult<Vec<u8>> {
    if capacity == 0 {
        return Err(UartError::ZeroCapacity);
    }
    let len = capacity.checked_add(1).ok_or(UartError::OutOfMemory)?;
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(len)
        .map_err(|_| UartError::OutOfMemory)?;
    storage.resize(len, 0);
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(SerialBuffer::new(0).unwrap_err(), UartError::ZeroCapacity);
    }

    #[test]
    fn test_write_until_full() {
        let mut buf = SerialBuffer::new(4).unwrap();
        assert_eq!(buf.write_slice(b"abcdef"), 4);
        assert!(buf.is_full());
        assert!(!buf.write(b'x'));
        assert_eq!(buf.available(), 4);
        assert_eq!(buf.free_space(), 0);
    }

    #[test]
    fn test_read_empty_returns_none() {
        let mut buf = SerialBuffer::new(2).unwrap();
        assert_eq!(buf.read(), None);
        assert_eq!(buf.peek(), None);
        assert_eq!(buf.peek_last(), None);
    }

    #[test]
    fn test_cursors_wrap() {
        let mut buf = SerialBuffer::new(3).unwrap();
        for round in 0..10u8 {
            assert!(buf.write(round));
            assert!(buf.write(round.wrapping_add(100)));
            assert_eq!(buf.read(), Some(round));
            assert_eq!(buf.peek_last(), Some(round.wrapping_add(100)));
            assert_eq!(buf.read(), Some(round.wrapping_add(100)));
            assert_eq!(buf.available() + buf.free_space(), 3);
        }
    }

    #[test]
    fn test_invariant_holds_for_mixed_sequence() {
        let mut buf = SerialBuffer::new(5).unwrap();
        let mut seed = 0x2545_f491_u32;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            if seed & 1 == 0 {
                buf.write(seed as u8);
            } else {
                buf.read();
            }
            assert_eq!(buf.available() + buf.free_space(), buf.capacity());
        }
    }

    #[test]
    fn test_partial_write_counts_free_space() {
        let mut buf = SerialBuffer::new(8).unwrap();
        buf.write_slice(b"12345");
        let before = buf.available();
        let free = buf.free_space();
        assert_eq!(buf.write_slice(b"abcdefgh"), free);
        assert_eq!(buf.available(), before + free);
    }

    #[test]
    fn test_find_after_wrap() {
        let mut buf = SerialBuffer::new(4).unwrap();
        buf.write_slice(b"abc");
        buf.read();
        buf.read();
        buf.write_slice(b"\r\n");
        assert_eq!(buf.find(b'\n'), Some(2));
        assert_eq!(buf.find(b'z'), None);
    }

    #[test]
    fn test_resize_keeps_content() {
        let mut buf = SerialBuffer::new(3).unwrap();
        buf.write_slice(b"xyz");
        buf.read();
        buf.write(b'w');
        assert_eq!(buf.resize(8), Ok(8));
        assert_eq!(buf.available(), 3);
        assert_eq!(buf.read(), Some(b'y'));
        assert_eq!(buf.read(), Some(b'z'));
        assert_eq!(buf.read(), Some(b'w'));
    }

    #[test]
    fn test_resize_refuses_to_drop_data() {
        let mut buf = SerialBuffer::new(6).unwrap();
        buf.write_slice(b"hello");
        assert_eq!(buf.resize(2), Ok(6));
        assert_eq!(buf.available(), 5);
    }

    #[test]
    fn test_clear_resets() {
        let mut buf = SerialBuffer::new(4).unwrap();
        buf.write_slice(b"ab");
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.free_space(), 4);
    }
}
