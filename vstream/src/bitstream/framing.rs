//! Start codes, alignment, and trailing bits.

use crate::bitstream::cursor::{Bitstream, Direction, StreamFormat};
use crate::error::{Error, Result};
use log::{debug, trace, warn};

/// The padding used to reach the next byte boundary.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AlignMode {
    /// All zero bits.
    Zero,

    /// All one bits.
    One,

    /// A single one bit followed by zero bits.
    OneThenZeros,
}

impl Bitstream {
    /// The padding bits needed to complete the in-flight byte.
    fn padding(&self, mode: AlignMode) -> u8 {
        let remaining = u32::from(self.bit_pos) + 1;
        match mode {
            AlignMode::Zero => 0,
            AlignMode::One => ((1u32 << remaining) - 1) as u8,
            AlignMode::OneThenZeros => 1 << self.bit_pos,
        }
    }

    /// Move to the next byte boundary, writing or checking padding bits.
    ///
    /// An already aligned cursor is left alone. When decoding, the padding
    /// bits actually present must match `mode`.
    pub fn align_byte(&mut self, mode: AlignMode) -> Result<()> {
        let pad = self.padding(mode);

        match self.direction() {
            Direction::Encode => {
                if self.bit_pos != 7 {
                    self.cur_byte |= pad;
                    self.transfer_byte()?;
                }
            }
            Direction::Decode => {
                if self.has_byte {
                    let width = u32::from(self.bit_pos) + 1;
                    let mut bits = 0u8;
                    self.u(&mut bits, width)?;
                    if bits != pad {
                        warn!("expected {:?} alignment, found {:#b}", mode, bits);
                        return Err(Error::InvalidCodeword("alignment padding mismatch"));
                    }
                }

                self.has_byte = false;
                self.bit_pos = 7;
            }
        }

        Ok(())
    }

    /// Transfer the trailing bits that end a unit of payload.
    ///
    /// For H.264 this is `rbsp_trailing_bits()`, a stop bit followed by zero
    /// alignment. MPEG payloads are simply zero aligned.
    pub fn end(&mut self) -> Result<()> {
        match self.format() {
            StreamFormat::H264 => {
                let mut stop = true;
                self.bit(&mut stop)?;
                if !stop {
                    return Err(Error::InvalidCodeword("missing rbsp stop bit"));
                }
                self.align_byte(AlignMode::Zero)
            }
            StreamFormat::Mpeg => self.align_byte(AlignMode::Zero),
            StreamFormat::H261 | StreamFormat::H263 => Err(Error::ContractViolation(
                "bit-oriented formats have no trailing bits",
            )),
        }
    }

    /// Transfer a start code and its payload.
    ///
    /// Byte-oriented formats require the cursor to be aligned; the code is
    /// `00 00 01` followed by `val`. When decoding, any number of zero bytes
    /// may precede the `01`, but there must be at least two, including zero
    /// bytes the cursor had already consumed.
    ///
    /// Bit-oriented formats write or expect the format's run of zero bits, a
    /// one bit, then a 4 or 5 bit payload.
    pub fn start_code(&mut self, val: &mut u8) -> Result<()> {
        match self.format() {
            StreamFormat::H261 => self.bit_start_code(val, 15, 4),
            StreamFormat::H263 => self.bit_start_code(val, 16, 5),
            StreamFormat::Mpeg | StreamFormat::H264 => self.byte_start_code(val),
        }
    }

    fn byte_start_code(&mut self, val: &mut u8) -> Result<()> {
        if !self.is_byte_aligned() {
            return Err(Error::Desync("start code at unaligned position"));
        }

        match self.direction() {
            Direction::Encode => {
                self.bytes.extend_from_slice(&[0, 0, 1, *val]);
                trace!("emitted start code {:02x} at byte {}", val, self.bytes.len() - 4);
            }
            Direction::Decode => {
                let mut zeros = self.zero_bytes;
                let byte = loop {
                    let byte = self.raw_byte()?;
                    if byte != 0 {
                        break byte;
                    }
                    zeros += 1;
                };

                if byte != 1 {
                    warn!("found byte {:02x} while looking for a start code", byte);
                    return Err(Error::InvalidCodeword("start code prefix not found"));
                }

                if zeros < 2 {
                    warn!("start code prefix preceded by only {} zero bytes", zeros);
                    return Err(Error::InvalidCodeword("start code prefix too short"));
                }

                *val = self.raw_byte()?;
                self.has_byte = false;
                trace!("parsed start code {:02x} at byte {}", val, self.byte_pos - 4);
            }
        }

        self.zero_bytes = 0;

        Ok(())
    }

    fn bit_start_code(&mut self, val: &mut u8, zero_bits: u32, payload_bits: u32) -> Result<()> {
        while self.zero_bits < zero_bits {
            let mut bit = false;
            self.bit(&mut bit)?;
            if bit {
                warn!("premature one bit while looking for a start code");
                return Err(Error::InvalidCodeword("start code prefix too short"));
            }
        }

        // Encoders emit the terminating one right away; decoders skip any
        // stuffing zeros before it.
        let mut bit = false;
        while !bit {
            bit = true;
            self.bit(&mut bit)?;
        }

        let mut payload = *val;
        for shift in (0..payload_bits).rev() {
            let mut bit = (payload >> shift) & 1 == 1;
            self.bit(&mut bit)?;
            payload = (payload & !(1 << shift)) | (u8::from(bit) << shift);
        }
        *val = payload;

        Ok(())
    }

    /// Skip forward to the next start code.
    ///
    /// Decode only. Any partially consumed byte is abandoned. Returns `true`
    /// with the cursor positioned so that `start_code` will succeed, or
    /// `false` if the stream ran out first.
    pub fn search_start_code(&mut self) -> Result<bool> {
        if self.is_encoding() {
            return Err(Error::ContractViolation("cannot search for start codes while encoding"));
        }

        let start = self.byte_pos;
        let found = match self.format().start_code_zero_bits() {
            Some(zero_bits) => loop {
                if !self.has_byte && self.byte_pos >= self.bytes.len() {
                    break false;
                }
                if self.zero_bits >= zero_bits {
                    break true;
                }

                let mut bit = false;
                if self.bit(&mut bit).is_err() {
                    break false;
                }
            },
            None => {
                self.has_byte = false;
                self.bit_pos = 7;

                loop {
                    let byte = match self.bytes.get(self.byte_pos) {
                        Some(byte) => *byte,
                        None => break false,
                    };

                    if self.zero_bytes >= 2 && byte == 1 {
                        break true;
                    }

                    if byte == 0 {
                        self.zero_bytes = (self.zero_bytes + 1).min(2);
                    } else {
                        self.zero_bytes = 0;
                    }
                    self.byte_pos += 1;
                }
            }
        };

        if found {
            debug!("resynchronized at byte {} after skipping {} bytes", self.byte_pos, self.byte_pos - start);
        } else {
            debug!("no start code found after byte {}", start);
        }

        Ok(found)
    }

    /// Check whether any payload remains before the trailing bits.
    ///
    /// Decode only. For H.264 this is `more_rbsp_data()`: the rest of the
    /// current byte must be exactly the stop bit and zero padding for the
    /// payload to be over. For MPEG any nonzero bit left in the current byte
    /// is more data. In both cases the payload also continues if the bytes
    /// that follow are not zero stuffing or another start code.
    pub fn has_more_data(&mut self) -> Result<bool> {
        if self.is_encoding() {
            return Err(Error::ContractViolation("cannot look ahead while encoding"));
        }

        let mask = ((1u32 << (u32::from(self.bit_pos) + 1)) - 1) as u8;
        let mut offset = self.byte_pos;

        match self.format() {
            StreamFormat::H264 => {
                let byte = if self.has_byte {
                    self.cur_byte
                } else {
                    let byte = *self.bytes.get(self.byte_pos).ok_or(Error::EndOfStream)?;
                    offset += 1;
                    byte
                };

                if byte & mask != 1 << self.bit_pos {
                    return Ok(true);
                }
            }
            StreamFormat::Mpeg => {
                if self.has_byte && self.cur_byte & mask != 0 {
                    return Ok(true);
                }
            }
            StreamFormat::H261 | StreamFormat::H263 => {
                return Err(Error::ContractViolation(
                    "bit-oriented formats cannot look ahead for more data",
                ));
            }
        }

        // Only zero stuffing or a start code may follow.
        let tail = self.bytes.get(offset..).unwrap_or(&[]);
        Ok(match tail {
            [first, ..] if *first != 0 => true,
            [_, second, ..] if *second != 0 => true,
            [_, _, third, ..] => *third > 2,
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::bitstream::{AlignMode, Bitstream, StreamFormat};
    use crate::error::Error;

    /// The regression sequence every format-independent change must keep
    /// producing.
    fn regression_sequence(bs: &mut Bitstream, values: &mut (u8, u32, u32, [u32; 3], [i32; 3])) {
        bs.start_code(&mut values.0).unwrap();
        bs.u(&mut values.1, 12).unwrap();
        bs.u(&mut values.2, 12).unwrap();
        for v in values.3.iter_mut() {
            bs.ue(v).unwrap();
        }
        for v in values.4.iter_mut() {
            bs.se(v).unwrap();
        }
        bs.align_byte(AlignMode::Zero).unwrap();
    }

    #[test]
    fn regression_round_trip() {
        for format in [StreamFormat::Mpeg, StreamFormat::H264].iter() {
            let mut expected = (0xde, 0x123, 0x456, [8, 7, 6], [0, -3, 3]);
            let mut bs = Bitstream::new_encoder(*format);
            regression_sequence(&mut bs, &mut expected);

            // 0001001 0001000 00111 1 00111 00110 00
            assert_eq!(
                &[0x00, 0x00, 0x01, 0xde, 0x12, 0x34, 0x56, 0x12, 0x20, 0xf3, 0x98],
                bs.bytes()
            );

            let mut actual = Default::default();
            let mut bs = Bitstream::new_decoder(*format, bs.into_bytes());
            regression_sequence(&mut bs, &mut actual);
            assert_eq!(expected, actual);
            assert!(bs.is_exhausted());
        }
    }

    #[test]
    fn alignment_padding() {
        for (mode, expected) in [
            (AlignMode::Zero, 0b1010_0000u8),
            (AlignMode::One, 0b1011_1111),
            (AlignMode::OneThenZeros, 0b1011_0000),
        ]
        .iter()
        {
            let mut bs = Bitstream::new_encoder(StreamFormat::H264);
            bs.u(&mut 0b101u8, 3).unwrap();
            bs.align_byte(*mode).unwrap();
            bs.align_byte(*mode).unwrap();
            assert_eq!(&[*expected], bs.bytes());

            let mut bs = Bitstream::new_decoder(StreamFormat::H264, [*expected]);
            bs.mark(0b101u8, 3).unwrap();
            bs.align_byte(*mode).unwrap();
            assert!(bs.is_exhausted());
        }

        let mut bs = Bitstream::new_decoder(StreamFormat::H264, [0b1010_0100]);
        bs.mark(0b101u8, 3).unwrap();
        assert_eq!(
            Error::InvalidCodeword("alignment padding mismatch"),
            bs.align_byte(AlignMode::Zero).unwrap_err()
        );
    }

    #[test]
    fn start_code_requires_alignment() {
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        bs.u(&mut 1u8, 1).unwrap();
        assert_eq!(
            Error::Desync("start code at unaligned position"),
            bs.start_code(&mut 0x65).unwrap_err()
        );
    }

    #[test]
    fn start_code_with_leading_zero_stuffing() {
        let mut bs = Bitstream::new_decoder(StreamFormat::H264, [0x00, 0x00, 0x00, 0x00, 0x01, 0x67]);
        let mut code = 0;
        bs.start_code(&mut code).unwrap();
        assert_eq!(0x67, code);
        assert!(bs.is_exhausted());

        let mut bs = Bitstream::new_decoder(StreamFormat::H264, [0x00, 0x01, 0x67]);
        assert_eq!(
            Error::InvalidCodeword("start code prefix too short"),
            bs.start_code(&mut code).unwrap_err()
        );

        let mut bs = Bitstream::new_decoder(StreamFormat::H264, [0x00, 0x00, 0x02, 0x67]);
        assert_eq!(
            Error::InvalidCodeword("start code prefix not found"),
            bs.start_code(&mut code).unwrap_err()
        );

        let mut bs = Bitstream::new_decoder(StreamFormat::H264, [0x00, 0x00]);
        assert_eq!(Error::EndOfStream, bs.start_code(&mut code).unwrap_err());
    }

    #[test]
    fn search_resynchronizes() {
        let data = [0x12, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x01, 0x41, 0x9a];
        let mut bs = Bitstream::new_decoder(StreamFormat::H264, &data[..]);
        bs.u(&mut 0u8, 3).unwrap();

        assert!(bs.search_start_code().unwrap());
        let mut code = 0;
        bs.start_code(&mut code).unwrap();
        assert_eq!(0x41, code);

        assert!(!bs.search_start_code().unwrap());
        assert!(bs.is_exhausted());

        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        bs.search_start_code().unwrap_err();
    }

    #[test]
    fn bit_oriented_start_codes() {
        let mut bs = Bitstream::new_encoder(StreamFormat::H263);
        bs.u(&mut 0b110u8, 3).unwrap();
        bs.start_code(&mut 0b10101).unwrap();
        bs.u(&mut 0b1u8, 1).unwrap();
        bs.align_byte(AlignMode::Zero).unwrap();

        // 110 000000000000000 1 10101 1 0000000
        assert_eq!(&[0b1100_0000, 0b0000_0000, 0b0011_0101, 0b1000_0000], bs.bytes());

        let mut bs = Bitstream::new_decoder(StreamFormat::H263, bs.into_bytes());
        bs.mark(0b110u8, 3).unwrap();
        let mut code = 0;
        bs.start_code(&mut code).unwrap();
        assert_eq!(0b10101, code);

        let mut bs = Bitstream::new_decoder(StreamFormat::H261, [0xF0, 0x00, 0x15]);
        assert!(bs.search_start_code().unwrap());
        let mut code = 0;
        bs.start_code(&mut code).unwrap();
        assert_eq!(0b0101, code);
    }

    #[test]
    fn rbsp_trailing_bits() {
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        bs.u(&mut 0b01u8, 2).unwrap();
        bs.end().unwrap();
        assert_eq!(&[0b0110_0000], bs.bytes());

        let mut bs = Bitstream::new_decoder(StreamFormat::H264, [0b0110_0000]);
        assert!(bs.has_more_data().unwrap());
        bs.mark(0b01u8, 2).unwrap();
        assert!(!bs.has_more_data().unwrap());
        bs.end().unwrap();
        assert!(bs.is_exhausted());

        let mut bs = Bitstream::new_decoder(StreamFormat::H264, [0b0100_0000]);
        bs.mark(0b01u8, 2).unwrap();
        assert_eq!(
            Error::InvalidCodeword("missing rbsp stop bit"),
            bs.end().unwrap_err()
        );
    }

    #[test]
    fn more_data_looks_past_the_current_byte() {
        // Stop bit pattern, then another slice's start code.
        let mut bs = Bitstream::new_decoder(StreamFormat::H264, [0x80, 0x00, 0x00, 0x01, 0x65]);
        assert!(!bs.has_more_data().unwrap());

        // Stop bit pattern, but real payload follows.
        let mut bs = Bitstream::new_decoder(StreamFormat::H264, [0x80, 0x07]);
        assert!(bs.has_more_data().unwrap());

        let mut bs = Bitstream::new_decoder(StreamFormat::H264, [0x80, 0x00, 0x00, 0x03, 0x01]);
        assert!(bs.has_more_data().unwrap());

        let mut bs = Bitstream::new_decoder(StreamFormat::H264, Vec::new());
        assert_eq!(Error::EndOfStream, bs.has_more_data().unwrap_err());

        let mut bs = Bitstream::new_decoder(StreamFormat::Mpeg, [0b1000_0000, 0x00, 0x00, 0x01, 0xb3]);
        bs.mark(1u8, 1).unwrap();
        assert!(!bs.has_more_data().unwrap());
        let mut bs = Bitstream::new_decoder(StreamFormat::Mpeg, [0b1010_0000]);
        bs.mark(1u8, 1).unwrap();
        assert!(bs.has_more_data().unwrap());
    }
}
