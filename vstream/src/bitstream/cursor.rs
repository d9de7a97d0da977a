//! Direction-symmetric bit cursor.

use crate::error::{Error, Result};
use crate::traits::BitField;
use log::warn;

/// Which way data flows through a `Bitstream`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Values handed to the cursor are appended to its buffer.
    Encode,

    /// Values handed to the cursor are overwritten with data from its buffer.
    Decode,
}

/// The framing rules of an elementary stream.
///
/// The format decides what a start code looks like and how the payload
/// avoids accidentally containing one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StreamFormat {
    /// H.261: bit-oriented start codes of 15 zero bits, a one, and 4 bits of
    /// payload.
    H261,

    /// MPEG-1 and MPEG-2 (H.262): byte-aligned `00 00 01 xx` start codes.
    /// The payload has no escape mechanism and must never contain two zero
    /// bytes followed by a small byte.
    Mpeg,

    /// H.263: bit-oriented start codes of 16 zero bits, a one, and 5 bits of
    /// payload.
    H263,

    /// H.264: byte-aligned `00 00 01 xx` start codes with `00 00 03`
    /// emulation prevention inside the payload.
    H264,
}

impl StreamFormat {
    /// How many consecutive zero bits make up a bit-oriented start code.
    pub(super) fn start_code_zero_bits(self) -> Option<u32> {
        match self {
            StreamFormat::H261 => Some(15),
            StreamFormat::H263 => Some(16),
            StreamFormat::Mpeg | StreamFormat::H264 => None,
        }
    }
}

/// A cursor that either writes or reads an elementary stream.
///
/// Every transfer method takes a mutable reference to the value being moved.
/// In `Direction::Encode` the value is read and appended to the stream; in
/// `Direction::Decode` it is overwritten with the value parsed from the
/// stream. Syntax written once in terms of these methods therefore both
/// produces and consumes the same bits.
pub struct Bitstream {
    direction: Direction,

    format: StreamFormat,

    /// The stream itself.
    ///
    /// While encoding this only ever grows. While decoding it never changes
    /// and `byte_pos` walks across it.
    pub(super) bytes: Vec<u8>,

    /// Index of the next byte to consume when decoding.
    pub(super) byte_pos: usize,

    /// The byte currently being filled or drained.
    pub(super) cur_byte: u8,

    /// Position of the next bit within `cur_byte`, counting down from the
    /// most significant bit at 7.
    pub(super) bit_pos: u8,

    /// Whether `cur_byte` holds a byte with undrained bits (decode only).
    pub(super) has_byte: bool,

    /// Number of consecutive zero bytes most recently transferred.
    pub(super) zero_bytes: u32,

    /// Number of consecutive zero bits most recently transferred.
    pub(super) zero_bits: u32,
}

impl Bitstream {
    /// Create a cursor that produces a new stream.
    pub fn new_encoder(format: StreamFormat) -> Self {
        Self {
            direction: Direction::Encode,
            format,
            bytes: Vec::new(),
            byte_pos: 0,
            cur_byte: 0,
            bit_pos: 7,
            has_byte: false,
            zero_bytes: 0,
            zero_bits: 0,
        }
    }

    /// Create a cursor that parses an existing stream.
    pub fn new_decoder(format: StreamFormat, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            direction: Direction::Decode,
            bytes: bytes.into(),
            ..Self::new_encoder(format)
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn is_encoding(&self) -> bool {
        self.direction == Direction::Encode
    }

    /// The bytes written so far, or the whole stream being decoded.
    ///
    /// A partially filled byte at the end of an encode is not included until
    /// the stream is aligned.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of whole bytes written, or consumed when decoding.
    pub fn byte_position(&self) -> usize {
        match self.direction {
            Direction::Encode => self.bytes.len(),
            Direction::Decode => self.byte_pos,
        }
    }

    /// Whether the cursor sits on a byte boundary.
    pub fn is_byte_aligned(&self) -> bool {
        self.bit_pos == 7
    }

    /// Whether a decoder has consumed every bit of its stream.
    pub fn is_exhausted(&self) -> bool {
        self.direction == Direction::Decode
            && !self.has_byte
            && self.byte_pos >= self.bytes.len()
    }

    /// Append one byte of payload, applying the format's escape rules.
    fn put_byte(&mut self, byte: u8) -> Result<()> {
        match self.format {
            StreamFormat::Mpeg if self.zero_bytes >= 2 && byte < 4 => {
                return Err(Error::Desync("start code emulated in payload"));
            }
            StreamFormat::H264 if self.zero_bytes == 2 && byte < 4 => {
                self.bytes.push(3);
                self.zero_bytes = 0;
            }
            _ => {}
        }

        self.bytes.push(byte);
        self.count_zero_byte(byte);

        Ok(())
    }

    /// Consume one byte of payload, validating and removing escapes.
    fn get_byte(&mut self) -> Result<u8> {
        let mut byte = self.raw_byte()?;

        match self.format {
            StreamFormat::Mpeg if self.zero_bytes >= 2 && byte < 4 => {
                warn!("start code prefix found inside payload at byte {}", self.byte_pos - 1);
                return Err(Error::Desync("start code emulated in payload"));
            }
            StreamFormat::H264 if self.zero_bytes == 2 => match byte {
                0..=2 => {
                    warn!("start code prefix found inside payload at byte {}", self.byte_pos - 1);
                    return Err(Error::Desync("start code emulated in payload"));
                }
                3 => {
                    self.zero_bytes = 0;
                    byte = self.raw_byte()?;
                    if byte > 3 {
                        warn!("invalid escape sequence 00 00 03 {:02x}", byte);
                        return Err(Error::InvalidCodeword("invalid escape sequence"));
                    }
                }
                _ => {}
            },
            _ => {}
        }

        self.count_zero_byte(byte);

        Ok(byte)
    }

    /// Consume one byte without any escape processing.
    pub(super) fn raw_byte(&mut self) -> Result<u8> {
        let byte = *self.bytes.get(self.byte_pos).ok_or(Error::EndOfStream)?;
        self.byte_pos += 1;

        Ok(byte)
    }

    fn count_zero_byte(&mut self, byte: u8) {
        if byte == 0 {
            self.zero_bytes += 1;
        } else {
            self.zero_bytes = 0;
        }
    }

    /// Flush the byte being filled when encoding, or load the next one when
    /// decoding.
    pub(super) fn transfer_byte(&mut self) -> Result<()> {
        match self.direction {
            Direction::Encode => {
                let byte = self.cur_byte;
                self.cur_byte = 0;
                self.bit_pos = 7;
                self.put_byte(byte)
            }
            Direction::Decode => {
                self.cur_byte = self.get_byte()?;
                self.has_byte = true;
                self.bit_pos = 7;
                Ok(())
            }
        }
    }

    /// Transfer a single bit.
    pub fn bit(&mut self, val: &mut bool) -> Result<()> {
        match self.direction {
            Direction::Encode => {
                self.cur_byte |= u8::from(*val) << self.bit_pos;
                if self.bit_pos == 0 {
                    self.transfer_byte()?;
                } else {
                    self.bit_pos -= 1;
                }
            }
            Direction::Decode => {
                if !self.has_byte {
                    self.transfer_byte()?;
                }

                *val = (self.cur_byte >> self.bit_pos) & 1 == 1;
                if self.bit_pos == 0 {
                    self.has_byte = false;
                    self.bit_pos = 7;
                } else {
                    self.bit_pos -= 1;
                }
            }
        }

        if *val {
            self.zero_bits = 0;
        } else {
            self.zero_bits += 1;
        }

        Ok(())
    }

    /// Transfer a fixed-width unsigned field, most significant bit first.
    ///
    /// `width` must not exceed the width of `T`. When encoding, `val` must
    /// fit in `width` bits.
    pub fn u<T: BitField>(&mut self, val: &mut T, width: u32) -> Result<()> {
        if width > T::bit_width() {
            return Err(Error::OutOfRange("field is wider than its type"));
        }

        let mut out = 0u64;
        let raw = val.to_u64().unwrap_or(0);
        if self.is_encoding() && width < 64 && raw >> width != 0 {
            return Err(Error::OutOfRange("value does not fit in its field"));
        }

        let limit = self.format.start_code_zero_bits();
        for shift in (0..width).rev() {
            let mut bit = (raw >> shift) & 1 == 1;
            self.bit(&mut bit)?;
            out |= u64::from(bit) << shift;

            if limit.map_or(false, |limit| self.zero_bits >= limit) {
                warn!("{} zero bits in a row inside a field", self.zero_bits);
                return Err(Error::Desync("start code emulated in payload"));
            }
        }

        if !self.is_encoding() {
            *val = T::from(out).ok_or(Error::OutOfRange("field does not fit in its type"))?;
        }

        Ok(())
    }

    /// Transfer an unsigned Exp-Golomb code, `ue(v)`.
    pub fn ue(&mut self, val: &mut u32) -> Result<()> {
        match self.direction {
            Direction::Encode => {
                if *val == u32::MAX {
                    return Err(Error::OutOfRange("exp-golomb value too large"));
                }

                let code = u64::from(*val) + 1;
                let leading_zeros = 63 - code.leading_zeros();
                for _ in 0..leading_zeros {
                    self.bit(&mut false)?;
                }
                self.bit(&mut true)?;

                let mut suffix = code - (1 << leading_zeros);
                self.u(&mut suffix, leading_zeros)
            }
            Direction::Decode => {
                let mut leading_zeros = 0;
                loop {
                    let mut bit = false;
                    self.bit(&mut bit)?;
                    if bit {
                        break;
                    }

                    leading_zeros += 1;
                    if leading_zeros > 31 {
                        return Err(Error::OutOfRange("exp-golomb code too long"));
                    }
                }

                let mut suffix = 0u64;
                self.u(&mut suffix, leading_zeros)?;

                *val = u32::try_from((1u64 << leading_zeros) - 1 + suffix)
                    .map_err(|_| Error::OutOfRange("exp-golomb value too large"))?;

                Ok(())
            }
        }
    }

    /// Transfer a signed Exp-Golomb code, `se(v)`.
    pub fn se(&mut self, val: &mut i32) -> Result<()> {
        let mut code = 0;
        if self.is_encoding() {
            code = match *val {
                i32::MIN => return Err(Error::OutOfRange("exp-golomb value too small")),
                v if v > 0 => v.unsigned_abs() * 2 - 1,
                v => v.unsigned_abs() * 2,
            };
        }

        self.ue(&mut code)?;

        if !self.is_encoding() {
            let magnitude = (code >> 1) as i32;
            *val = if code & 1 == 1 {
                magnitude + 1
            } else {
                -magnitude
            };
        }

        Ok(())
    }

    /// Transfer a field whose value is fixed by the grammar.
    ///
    /// Decoding a different value is an invalid codeword.
    pub fn mark<T: BitField>(&mut self, value: T, width: u32) -> Result<()> {
        let mut field = value;
        self.u(&mut field, width)?;

        if field != value {
            warn!("expected marker {:?}, found {:?}", value, field);
            return Err(Error::InvalidCodeword("marker bits mismatch"));
        }

        Ok(())
    }

    /// Handle a field that is absent from the stream and takes an implied
    /// value.
    ///
    /// Decoding assigns the implied value. Encoding requires that the caller
    /// already set it.
    pub fn infer<T: PartialEq + Copy>(&mut self, val: &mut T, implied: T) -> Result<()> {
        match self.direction {
            Direction::Encode if *val != implied => Err(Error::ContractViolation(
                "value differs from the one implied by the syntax",
            )),
            Direction::Encode => Ok(()),
            Direction::Decode => {
                *val = implied;
                Ok(())
            }
        }
    }
}
