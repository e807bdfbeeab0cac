use super::error::DecodeError;

/// A read-only, byte-granular view over a marshalled stream.
///
/// Unlike an owning reader this never copies the input; it just tracks how
/// far into `buffer` we've read, which keeps every decoded `&str`/`&[u8]`
/// borrowed straight from the original bytes where possible.
pub struct Cursor<'input> {
    buffer: &'input [u8],
    offset: usize,
}

impl<'input> Cursor<'input> {
    pub fn new(buffer: &'input [u8]) -> Self {
        Cursor { buffer, offset: 0 }
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    fn take(&mut self, n: usize) -> Result<&'input [u8], DecodeError> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|&end| end <= self.buffer.len())
            .ok_or(DecodeError::UnexpectedEndOfStream {
                offset: self.offset,
            })?;
        let slice = &self.buffer[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        self.buffer
            .get(self.offset)
            .copied()
            .ok_or(DecodeError::UnexpectedEndOfStream {
                offset: self.offset,
            })
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32_le(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_u32_le()? as i32)
    }

    pub fn read_i64_le(&mut self) -> Result<i64, DecodeError> {
        let bytes = self.take(8)?;
        Ok(i64::from_le_bytes(bytes.try_into().expect("8 bytes")))
    }

    pub fn read_f64_le(&mut self) -> Result<f64, DecodeError> {
        let bytes = self.take(8)?;
        Ok(f64::from_le_bytes(bytes.try_into().expect("8 bytes")))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'input [u8], DecodeError> {
        self.take(n)
    }

    pub fn is_at_end(&self) -> bool {
        self.offset >= self.buffer.len()
    }
}
