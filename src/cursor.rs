use crate::error::CursorError;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Byte order of the integer fields in a container.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    pub(crate) fn read_u16(self, buffer: &[u8]) -> u16 {
        match self {
            Endian::Big => BigEndian::read_u16(buffer),
            Endian::Little => LittleEndian::read_u16(buffer),
        }
    }

    pub(crate) fn read_u32(self, buffer: &[u8]) -> u32 {
        match self {
            Endian::Big => BigEndian::read_u32(buffer),
            Endian::Little => LittleEndian::read_u32(buffer),
        }
    }

    pub(crate) fn write_u16(self, buffer: &mut [u8], value: u16) {
        match self {
            Endian::Big => BigEndian::write_u16(buffer, value),
            Endian::Little => LittleEndian::write_u16(buffer, value),
        }
    }

    pub(crate) fn write_u32(self, buffer: &mut [u8], value: u32) {
        match self {
            Endian::Big => BigEndian::write_u32(buffer, value),
            Endian::Little => LittleEndian::write_u32(buffer, value),
        }
    }
}

/// Sequential reader over a byte buffer.
///
/// Every access is bounds checked and fails with a [`CursorError`] instead
/// of reading past the buffer.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
    endian: Endian,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8], endian: Endian) -> ByteReader<'a> {
        ByteReader {
            data,
            position: 0,
            endian,
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub(crate) fn seek(&mut self, position: usize) -> Result<(), CursorError> {
        if position > self.data.len() {
            return Err(CursorError::OutOfBounds {
                position,
                length: self.data.len(),
            });
        }

        self.position = position;

        Ok(())
    }

    fn take(&mut self, length: usize) -> Result<&'a [u8], CursorError> {
        if length > self.remaining() {
            return Err(CursorError::UnexpectedEof {
                offset: self.position,
                need: length,
                have: self.remaining(),
            });
        }

        let bytes = &self.data[self.position..self.position + length];
        self.position += length;

        Ok(bytes)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, CursorError> {
        Ok(self.endian.read_u32(self.take(4)?))
    }

    pub(crate) fn read_exact(&mut self, length: usize) -> Result<&'a [u8], CursorError> {
        self.take(length)
    }
}

/// Overwriting writer over a fixed length byte buffer.
///
/// The buffer is allocated zero filled up front, so everything not
/// explicitly written stays zero padding.
pub(crate) struct ByteWriter {
    data: Vec<u8>,
    position: usize,
    endian: Endian,
}

impl ByteWriter {
    pub(crate) fn with_length(length: usize, endian: Endian) -> ByteWriter {
        ByteWriter {
            data: vec![0; length],
            position: 0,
            endian,
        }
    }

    pub(crate) fn seek(&mut self, position: usize) -> Result<(), CursorError> {
        if position > self.data.len() {
            return Err(CursorError::OutOfBounds {
                position,
                length: self.data.len(),
            });
        }

        self.position = position;

        Ok(())
    }

    fn take_mut(&mut self, length: usize) -> Result<&mut [u8], CursorError> {
        if self.position + length > self.data.len() {
            return Err(CursorError::OutOfBounds {
                position: self.position + length,
                length: self.data.len(),
            });
        }

        let bytes = &mut self.data[self.position..self.position + length];
        self.position += length;

        Ok(bytes)
    }

    pub(crate) fn write_u32(&mut self, value: u32) -> Result<(), CursorError> {
        let endian = self.endian;
        endian.write_u32(self.take_mut(4)?, value);

        Ok(())
    }

    pub(crate) fn write_all(&mut self, bytes: &[u8]) -> Result<(), CursorError> {
        self.take_mut(bytes.len())?.copy_from_slice(bytes);

        Ok(())
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
