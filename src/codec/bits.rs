use super::CodecError;

/// Packs fixed-width fields most significant bit first.
#[derive(Debug, Default)]
pub(crate) struct BitWriter {
    bytes: Vec<u8>,
    used: u8,
}

impl BitWriter {
    pub(crate) fn write(&mut self, value: u32, width: u8) {
        for bit in (0..width).rev() {
            if self.used == 0 {
                self.bytes.push(0);
            }
            let set = (value >> bit) & 1 == 1;
            if let Some(last) = self.bytes.last_mut() {
                *last |= (set as u8) << (7 - self.used);
            }
            self.used = (self.used + 1) % 8;
        }
    }

    pub(crate) fn write_bool(&mut self, value: bool) {
        self.write(value as u32, 1);
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.write(u32::from(*byte), 8);
        }
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reads fields written by a [`BitWriter`].
pub(crate) struct BitReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub(crate) fn read(&mut self, width: u8) -> Result<u32, CodecError> {
        let mut value = 0;
        for _ in 0..width {
            let byte = self.bytes.get(self.position / 8).ok_or(CodecError::Truncated)?;
            let bit = (byte >> (7 - self.position % 8)) & 1;
            value = (value << 1) | u32::from(bit);
            self.position += 1;
        }
        Ok(value)
    }

    pub(crate) fn read_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.read(1)? == 1)
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, CodecError> {
        (0..len).map(|_| self.read(8).map(|b| b as u8)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_straddle_bytes() {
        let mut writer = BitWriter::default();
        writer.write(0b101, 3);
        writer.write(0x3f, 6);
        writer.write_bool(false);
        writer.write(0xabc, 12);
        let bytes = writer.finish();
        assert_eq!(bytes.len(), 3);
        assert_eq!(bytes[0], 0b1011_1111);

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read(3).unwrap(), 0b101);
        assert_eq!(reader.read(6).unwrap(), 0x3f);
        assert!(!reader.read_bool().unwrap());
        assert_eq!(reader.read(12).unwrap(), 0xabc);
        assert!(matches!(reader.read(8), Err(CodecError::Truncated)));
    }
}
