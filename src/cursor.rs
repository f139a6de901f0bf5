//! # Byte Cursors
//!
//! This module provides the fixed-position read and write cursors every other
//! layer of the codec is built on. Both cursors operate over a contiguous,
//! caller-owned byte region: `ByteReader` borrows an immutable slice and
//! `ByteWriter` borrows a mutable one. Neither performs any allocation, and
//! the writer never grows its buffer. Callers size write buffers up front
//! (see [`crate::document::recommended_capacity`]) and a write past the end
//! fails with a capacity error.
//!
//! ## Endianness
//!
//! All multi-byte fixed-width values are encoded little-endian on every host,
//! so documents are portable across architectures.
//!
//! ## Bounds Checking
//!
//! The default build validates every access and reports overruns as errors.
//! With the `unchecked` cargo feature the checks become debug assertions and
//! release builds use unchecked slice access; out-of-range positions are then
//! undefined behavior. The feature exists for trusted-input hot paths only.
//!
//! ## Seek Semantics
//!
//! `seek` only repositions the cursor; validation happens at the next access.
//! Reads of byte ranges return slices borrowed from the underlying buffer,
//! never copies.

use eyre::Result;

#[cfg(not(feature = "unchecked"))]
use eyre::ensure;

/// Read cursor over an immutable byte buffer.
///
/// All `read_*` methods consume bytes at the current position and advance it.
/// Multi-byte values are little-endian.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    #[cfg(not(feature = "unchecked"))]
    #[inline]
    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self.position.checked_add(count).ok_or_else(|| {
            eyre::eyre!("read position overflow at {} + {}", self.position, count)
        })?;
        ensure!(
            end <= self.data.len(),
            "read of {} bytes at position {} overruns buffer of {} bytes",
            count,
            self.position,
            self.data.len()
        );
        let slice = &self.data[self.position..end];
        self.position = end;
        Ok(slice)
    }

    #[cfg(feature = "unchecked")]
    #[inline]
    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self.position + count;
        debug_assert!(end <= self.data.len());
        // SAFETY: the caller opted into the unchecked feature and guarantees
        // positions stay within the buffer.
        let slice = unsafe { self.data.get_unchecked(self.position..end) };
        self.position = end;
        Ok(slice)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? == 1)
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        let bytes = self.take(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.take(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    #[inline]
    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.take(8)?;
        Ok(f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Returns `count` bytes starting at the current position as a slice
    /// borrowed from the underlying buffer.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.take(count)
    }
}

/// Write cursor over a mutable byte buffer of fixed capacity.
///
/// The buffer never grows; a write past the end is a capacity error in the
/// default build.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    position: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, position: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    #[cfg(not(feature = "unchecked"))]
    #[inline]
    fn reserve(&mut self, count: usize) -> Result<&mut [u8]> {
        let end = self.position.checked_add(count).ok_or_else(|| {
            eyre::eyre!("write position overflow at {} + {}", self.position, count)
        })?;
        ensure!(
            end <= self.buf.len(),
            "write of {} bytes at position {} exceeds buffer capacity of {} bytes",
            count,
            self.position,
            self.buf.len()
        );
        let slice = &mut self.buf[self.position..end];
        self.position = end;
        Ok(slice)
    }

    #[cfg(feature = "unchecked")]
    #[inline]
    fn reserve(&mut self, count: usize) -> Result<&mut [u8]> {
        let end = self.position + count;
        debug_assert!(end <= self.buf.len());
        // SAFETY: the caller opted into the unchecked feature and guarantees
        // writes stay within the buffer.
        let slice = unsafe { self.buf.get_unchecked_mut(self.position..end) };
        self.position = end;
        Ok(slice)
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.reserve(1)?[0] = value;
        Ok(())
    }

    #[inline]
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(if value { 1 } else { 0 })
    }

    #[inline]
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.reserve(2)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    #[inline]
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.reserve(2)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.reserve(4)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    #[inline]
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.reserve(4)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    #[inline]
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.reserve(8)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_roundtrip() {
        let mut buf = [0u8; 32];
        let mut writer = ByteWriter::new(&mut buf);

        writer.write_u8(0xAB).unwrap();
        writer.write_bool(true).unwrap();
        writer.write_i16(-1234).unwrap();
        writer.write_u32(0xDEAD_BEEF).unwrap();
        writer.write_f32(1.5).unwrap();
        writer.write_f64(-2.25).unwrap();
        let written = writer.position();

        let mut reader = ByteReader::new(&buf[..written]);
        assert_eq!(reader.read_u8().unwrap(), 0xAB);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_i16().unwrap(), -1234);
        assert_eq!(reader.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
        assert_eq!(reader.read_f64().unwrap(), -2.25);
        assert_eq!(reader.position(), written);
    }

    #[test]
    fn values_are_little_endian() {
        let mut buf = [0u8; 8];
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_u32(0x0102_0304).unwrap();
        assert_eq!(&buf[..4], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn seek_repositions_reads() {
        let data = [1u8, 2, 3, 4];
        let mut reader = ByteReader::new(&data);
        reader.seek(2);
        assert_eq!(reader.read_u8().unwrap(), 3);
        reader.seek(0);
        assert_eq!(reader.read_u8().unwrap(), 1);
    }

    #[test]
    fn read_bytes_borrows_from_buffer() {
        let data = [1u8, 2, 3, 4, 5];
        let mut reader = ByteReader::new(&data);
        reader.seek(1);
        let slice = reader.read_bytes(3).unwrap();
        assert_eq!(slice, &[2, 3, 4]);
        assert_eq!(reader.position(), 4);
    }

    #[cfg(not(feature = "unchecked"))]
    #[test]
    fn read_past_end_fails() {
        let data = [1u8, 2];
        let mut reader = ByteReader::new(&data);
        assert!(reader.read_u32().is_err());

        reader.seek(1);
        assert!(reader.read_i16().is_err());
    }

    #[cfg(not(feature = "unchecked"))]
    #[test]
    fn write_past_capacity_fails() {
        let mut buf = [0u8; 3];
        let mut writer = ByteWriter::new(&mut buf);
        writer.write_u8(1).unwrap();
        assert!(writer.write_u32(2).is_err());
    }

    #[cfg(not(feature = "unchecked"))]
    #[test]
    fn write_after_seek_past_end_fails() {
        let mut buf = [0u8; 4];
        let mut writer = ByteWriter::new(&mut buf);
        writer.seek(10);
        assert!(writer.write_u8(1).is_err());
    }
}
