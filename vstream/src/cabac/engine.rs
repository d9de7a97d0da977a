//! The binary arithmetic coding engine.
//!
//! The same engine drives both directions. While encoding, `offset` is the
//! low end of the coding interval (`codILow`) and carries are resolved
//! through a count of outstanding bits. While decoding, it is the 9-bit
//! window into the stream (`codIOffset`).

use crate::bitstream::{Bitstream, Direction};
use crate::cabac::context::ContextBank;
use crate::cabac::tables::CabacTables;
use crate::error::{Error, Result};
use log::trace;

/// An arithmetic coder bound to a set of probability tables and a context
/// bank.
#[derive(Clone, Debug)]
pub struct Cabac {
    tables: &'static CabacTables,
    contexts: ContextBank,
    range: u32,
    offset: u32,
    first_bit: bool,
    bits_outstanding: u32,
    bin_count: u64,
}

impl Cabac {
    /// Create a coder. `init` must be called before coding any bins.
    pub fn new(tables: &'static CabacTables, contexts: ContextBank) -> Self {
        Self {
            tables,
            contexts,
            range: 510,
            offset: 0,
            first_bit: true,
            bits_outstanding: 0,
            bin_count: 0,
        }
    }

    /// Start arithmetic coding at the current, byte aligned, stream position.
    ///
    /// The decoder reads its 9-bit offset here and fails with `Desync` if
    /// it is 510 or 511, which no encoder can produce.
    pub fn init(&mut self, bs: &mut Bitstream) -> Result<()> {
        if !bs.is_byte_aligned() {
            return Err(Error::Desync("arithmetic coding must start byte aligned"));
        }

        self.range = 510;
        self.bits_outstanding = 0;
        self.first_bit = true;

        match bs.direction() {
            Direction::Encode => self.offset = 0,
            Direction::Decode => {
                let mut offset = 0u32;
                bs.u(&mut offset, 9)?;
                if offset >= 510 {
                    return Err(Error::Desync("arithmetic decoder offset out of range"));
                }
                self.offset = offset;
            }
        }

        trace!("cabac init at byte {}", bs.byte_position());

        Ok(())
    }

    pub fn contexts(&self) -> &ContextBank {
        &self.contexts
    }

    pub fn contexts_mut(&mut self) -> &mut ContextBank {
        &mut self.contexts
    }

    pub fn into_contexts(self) -> ContextBank {
        self.contexts
    }

    /// How many bins have been coded since the coder was created.
    pub fn bin_count(&self) -> u64 {
        self.bin_count
    }

    fn put_bit(&mut self, bs: &mut Bitstream, bit: bool) -> Result<()> {
        if self.first_bit {
            self.first_bit = false;
            if bit {
                return Err(Error::Desync("carry out of the first arithmetic coder bit"));
            }
        } else {
            bs.bit(&mut bit.clone())?;
        }

        while self.bits_outstanding > 0 {
            bs.bit(&mut !bit)?;
            self.bits_outstanding -= 1;
        }

        Ok(())
    }

    fn renorm(&mut self, bs: &mut Bitstream) -> Result<()> {
        while self.range < 256 {
            self.range <<= 1;
            self.offset <<= 1;

            match bs.direction() {
                Direction::Encode => {
                    if self.offset < 512 {
                        self.put_bit(bs, false)?;
                    } else if self.offset >= 1024 {
                        self.offset -= 1024;
                        self.put_bit(bs, true)?;
                    } else {
                        self.offset -= 512;
                        self.bits_outstanding += 1;
                    }
                }
                Direction::Decode => {
                    let mut bit = false;
                    bs.bit(&mut bit)?;
                    self.offset |= u32::from(bit);
                }
            }
        }

        Ok(())
    }

    /// Code one bin with the adaptive context `ctx_idx`, then update that
    /// context.
    pub fn decision(&mut self, bs: &mut Bitstream, ctx_idx: usize, bin: &mut bool) -> Result<()> {
        let mut ctx = *self
            .contexts
            .get(ctx_idx)
            .ok_or(Error::OutOfRange("context index outside of the bank"))?;
        if ctx.state > 63 {
            return Err(Error::OutOfRange("context state above 63"));
        }

        let state = usize::from(ctx.state);
        let quarter = ((self.range >> 6) & 3) as usize;
        let range_lps = u32::from(self.tables.range_lps[state][quarter]);
        self.range -= range_lps;

        match bs.direction() {
            Direction::Encode => {
                if *bin != ctx.mps {
                    self.offset += self.range;
                    self.range = range_lps;
                }
            }
            Direction::Decode => {
                if self.offset >= self.range {
                    *bin = !ctx.mps;
                    self.offset -= self.range;
                    self.range = range_lps;
                } else {
                    *bin = ctx.mps;
                }
            }
        }

        if *bin == ctx.mps {
            ctx.state = self.tables.trans_idx_mps[state];
        } else {
            if ctx.state == 0 {
                ctx.mps = !ctx.mps;
            }
            ctx.state = self.tables.trans_idx_lps[state];
        }
        self.contexts[ctx_idx] = ctx;
        self.bin_count += 1;

        self.renorm(bs)
    }

    /// Code one equiprobable bin.
    pub fn bypass(&mut self, bs: &mut Bitstream, bin: &mut bool) -> Result<()> {
        self.offset <<= 1;

        match bs.direction() {
            Direction::Encode => {
                if *bin {
                    self.offset += self.range;
                }

                if self.offset >= 1024 {
                    self.offset -= 1024;
                    self.put_bit(bs, true)?;
                } else if self.offset < 512 {
                    self.put_bit(bs, false)?;
                } else {
                    self.offset -= 512;
                    self.bits_outstanding += 1;
                }
            }
            Direction::Decode => {
                let mut bit = false;
                bs.bit(&mut bit)?;
                self.offset |= u32::from(bit);

                if self.offset >= self.range {
                    *bin = true;
                    self.offset -= self.range;
                } else {
                    *bin = false;
                }
            }
        }
        self.bin_count += 1;

        Ok(())
    }

    /// Code a bin against the fixed terminating probability.
    ///
    /// A terminating bin of one ends arithmetic coding. The encoder flushes
    /// the interval and writes the stop bit after it, and the decoder checks
    /// that the last bit it read was that stop bit. Either way, the stream is
    /// left ready for zero padding up to the next byte boundary.
    pub fn terminate(&mut self, bs: &mut Bitstream, bin: &mut bool) -> Result<()> {
        self.range -= 2;

        match bs.direction() {
            Direction::Encode => {
                if *bin {
                    self.offset += self.range;
                    self.range = 2;
                    self.renorm(bs)?;
                    self.put_bit(bs, (self.offset >> 9) & 1 == 1)?;
                    bs.bit(&mut ((self.offset >> 8) & 1 == 1))?;
                    bs.bit(&mut true)?;
                } else {
                    self.renorm(bs)?;
                }
            }
            Direction::Decode => {
                if self.offset >= self.range {
                    *bin = true;
                    if self.offset & 1 != 1 {
                        return Err(Error::Desync("missing stop bit after arithmetic coding"));
                    }
                } else {
                    *bin = false;
                    self.renorm(bs)?;
                }
            }
        }
        self.bin_count += 1;

        if *bin {
            trace!("cabac terminated after {} bins", self.bin_count);
        }

        Ok(())
    }
}
