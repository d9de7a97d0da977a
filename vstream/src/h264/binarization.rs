//! CABAC binarizations (9.3.2)
//!
//! Table-driven binarizations are prefix trees. Each value lists its bins as
//! (slot, bin) pairs, where the slot picks the context of the bin through a
//! per-call map. Walking the tree is the same for every element, only the
//! maps differ.

use crate::bitstream::Bitstream;
use crate::cabac::Cabac;
use crate::error::{Error, Result};
use crate::h264::ctxidx;

/// One value of a tree binarization and the bins that code it.
pub struct BinString<T: 'static> {
    pub leaf: Leaf<T>,
    pub bins: &'static [(u8, bool)],
}

pub enum Leaf<T: 'static> {
    Value(T),

    /// The bins are a prefix, followed by one of the strings of another tree.
    Nested(&'static [BinString<T>]),
}

/// Slot to context index map. `ctxidx::TERMINATE` codes a slot's bins with
/// the terminate procedure.
pub type SlotMap = [usize; 11];

fn contains<T: PartialEq>(tree: &[BinString<T>], val: &T) -> bool {
    tree.iter().any(|string| match &string.leaf {
        Leaf::Value(v) => v == val,
        Leaf::Nested(sub) => contains(sub, val),
    })
}

fn code_bin(bs: &mut Bitstream, cabac: &mut Cabac, ctx_idx: usize, bin: &mut bool) -> Result<()> {
    if ctx_idx == ctxidx::TERMINATE {
        cabac.terminate(bs, bin)
    } else {
        cabac.decision(bs, ctx_idx, bin)
    }
}

/// Transfer a value through a tree binarization.
pub fn tree<T: PartialEq + Copy>(
    bs: &mut Bitstream,
    cabac: &mut Cabac,
    tree: &'static [BinString<T>],
    slots: &SlotMap,
    val: &mut T,
) -> Result<()> {
    if bs.is_encoding() {
        let string = tree
            .iter()
            .find(|string| match &string.leaf {
                Leaf::Value(v) => v == val,
                Leaf::Nested(sub) => contains(sub, val),
            })
            .ok_or(Error::InvalidCodeword("value has no binarization"))?;

        for &(slot, bin) in string.bins {
            code_bin(bs, cabac, slots[usize::from(slot)], &mut bin.clone())?;
        }

        return match &string.leaf {
            Leaf::Value(_) => Ok(()),
            Leaf::Nested(sub) => self::tree(bs, cabac, sub, slots, val),
        };
    }

    let mut prefix = [false; 8];
    let mut len = 0;
    loop {
        let matching = |string: &&BinString<T>| {
            string.bins.len() > len
                && string.bins[..len]
                    .iter()
                    .zip(&prefix[..len])
                    .all(|(&(_, bin), &seen)| bin == seen)
        };

        let next = tree
            .iter()
            .find(matching)
            .ok_or(Error::InvalidCodeword("bins match no binarization"))?;

        let mut bin = false;
        code_bin(bs, cabac, slots[usize::from(next.bins[len].0)], &mut bin)?;
        prefix[len] = bin;
        len += 1;

        let done = tree.iter().find(|string| {
            string.bins.len() == len
                && string
                    .bins
                    .iter()
                    .zip(&prefix[..len])
                    .all(|(&(_, bin), &seen)| bin == seen)
        });

        match done.map(|string| &string.leaf) {
            Some(Leaf::Value(v)) => {
                *val = *v;
                return Ok(());
            }
            Some(Leaf::Nested(sub)) => return self::tree(bs, cabac, sub, slots, val),
            None if len == prefix.len() => {
                return Err(Error::InvalidCodeword("bins match no binarization"));
            }
            None => {}
        }
    }
}

/// Unary bins, truncated at `c_max` if given. Bin `i` uses context
/// `ctx[i]`, and the last context repeats for the bins past the list.
pub fn unary(
    bs: &mut Bitstream,
    cabac: &mut Cabac,
    ctx: &[usize],
    c_max: Option<u32>,
    val: &mut u32,
) -> Result<()> {
    let ctx_at = |i: u32| ctx[(i as usize).min(ctx.len() - 1)];

    if let Some(c_max) = c_max {
        if bs.is_encoding() && *val > c_max {
            return Err(Error::OutOfRange("value above its truncated unary maximum"));
        }
    }

    let mut i = 0;
    loop {
        if Some(i) == c_max {
            break;
        }

        let mut bin = i < *val;
        cabac.decision(bs, ctx_at(i), &mut bin)?;
        if !bin {
            break;
        }

        i = i
            .checked_add(1)
            .ok_or(Error::OutOfRange("unary value too large"))?;
    }

    *val = i;
    Ok(())
}

/// 9.3.2.3 `UEGk`: a truncated unary prefix with contexts from `ctx`, as
/// for `unary`, then a `k`-th order Exp-Golomb bypass suffix once the prefix
/// reaches `u_coff`, then a bypass sign if `signed` and the value is not
/// zero.
pub fn ueg(
    bs: &mut Bitstream,
    cabac: &mut Cabac,
    k: u32,
    u_coff: u32,
    signed: bool,
    ctx: &[usize],
    val: &mut i32,
) -> Result<()> {
    if bs.is_encoding() && (*val == i32::MIN || (!signed && *val < 0)) {
        return Err(Error::OutOfRange("value has no UEGk binarization"));
    }

    let mut abs = val.unsigned_abs();
    let mut prefix = abs.min(u_coff);
    unary(bs, cabac, ctx, Some(u_coff), &mut prefix)?;

    if prefix == u_coff {
        let mut k = k;
        if bs.is_encoding() {
            let mut suffix = abs - u_coff;
            loop {
                if suffix >= 1 << k {
                    cabac.bypass(bs, &mut true)?;
                    suffix -= 1 << k;
                    k += 1;
                } else {
                    cabac.bypass(bs, &mut false)?;
                    while k > 0 {
                        k -= 1;
                        cabac.bypass(bs, &mut ((suffix >> k) & 1 == 1))?;
                    }
                    break;
                }
            }
        } else {
            let mut suffix = 0u64;
            loop {
                let mut bin = false;
                cabac.bypass(bs, &mut bin)?;
                if !bin {
                    break;
                }

                suffix += 1 << k;
                k += 1;
                if k > 31 {
                    return Err(Error::OutOfRange("exp-golomb suffix too long"));
                }
            }

            while k > 0 {
                k -= 1;
                let mut bin = false;
                cabac.bypass(bs, &mut bin)?;
                suffix += u64::from(bin) << k;
            }

            abs = u32::try_from(suffix + u64::from(u_coff))
                .ok()
                .filter(|&abs| abs <= i32::MAX as u32)
                .ok_or(Error::OutOfRange("UEGk value too large"))?;
        }
    } else {
        abs = prefix;
    }

    let mut negative = *val < 0;
    if signed && abs != 0 {
        cabac.bypass(bs, &mut negative)?;
    }

    if !bs.is_encoding() {
        *val = if negative { -(abs as i32) } else { abs as i32 };
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::bitstream::{AlignMode, Bitstream, StreamFormat};
    use crate::cabac::{Cabac, ContextBank, H264_TABLES};
    use crate::error::Error;
    use crate::h264::binarization::{self, BinString, Leaf, SlotMap};

    static INNER: [BinString<u8>; 2] = [
        BinString {
            leaf: Leaf::Value(10),
            bins: &[(2, false)],
        },
        BinString {
            leaf: Leaf::Value(11),
            bins: &[(2, true), (3, true)],
        },
    ];

    static OUTER: [BinString<u8>; 3] = [
        BinString {
            leaf: Leaf::Value(0),
            bins: &[(0, false)],
        },
        BinString {
            leaf: Leaf::Nested(&INNER),
            bins: &[(0, true), (1, false)],
        },
        BinString {
            leaf: Leaf::Value(1),
            bins: &[(0, true), (1, true)],
        },
    ];

    const SLOTS: SlotMap = [5, 8, 6, 7, 0, 0, 0, 0, 0, 0, 0];

    fn coder() -> Cabac {
        Cabac::new(&H264_TABLES, ContextBank::new(ContextBank::H264_LEN))
    }

    /// Run `code` once to encode and once to decode, and check both agree.
    fn round_trip<T: PartialEq + std::fmt::Debug + Clone>(
        values: &[T],
        blank: T,
        code: impl Fn(&mut Bitstream, &mut Cabac, &mut T) -> crate::error::Result<()>,
    ) {
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        let mut cabac = coder();
        cabac.init(&mut bs).unwrap();
        for value in values {
            code(&mut bs, &mut cabac, &mut value.clone()).unwrap();
        }
        cabac.terminate(&mut bs, &mut true).unwrap();
        bs.align_byte(AlignMode::Zero).unwrap();

        let mut dec = Bitstream::new_decoder(StreamFormat::H264, bs.into_bytes());
        let mut cabac = coder();
        cabac.init(&mut dec).unwrap();
        for value in values {
            let mut out = blank.clone();
            code(&mut dec, &mut cabac, &mut out).unwrap();
            assert_eq!(value, &out);
        }
    }

    #[test]
    fn tree_round_trip() {
        round_trip(&[0u8, 10, 11, 1, 0, 11, 11, 10, 1], 99, |bs, cabac, val| {
            binarization::tree(bs, cabac, &OUTER, &SLOTS, val)
        });
    }

    #[test]
    fn tree_rejects_unknown_values() {
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        let mut cabac = coder();
        cabac.init(&mut bs).unwrap();
        assert_eq!(
            Error::InvalidCodeword("value has no binarization"),
            binarization::tree(&mut bs, &mut cabac, &OUTER, &SLOTS, &mut 7).unwrap_err()
        );
    }

    #[test]
    fn unary_round_trip() {
        round_trip(&[0u32, 1, 2, 3, 9, 3, 0], 99, |bs, cabac, val| {
            binarization::unary(bs, cabac, &[60, 62, 63], None, val)
        });
        round_trip(&[0u32, 3, 1, 2, 3], 99, |bs, cabac, val| {
            binarization::unary(bs, cabac, &[64, 67], Some(3), val)
        });
    }

    #[test]
    fn ueg_round_trip() {
        round_trip(&[0i32, 1, -1, 8, -9, 9, 10, -200, 65535, -1 << 20], 0, |bs, cabac, val| {
            binarization::ueg(bs, cabac, 3, 9, true, &[40, 43, 44, 45, 46], val)
        });
        round_trip(&[0i32, 13, 14, 15, 100, 5000], 0, |bs, cabac, val| {
            binarization::ueg(bs, cabac, 0, 14, false, &[228, 233], val)
        });
    }

    #[test]
    fn ueg_range_checks() {
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        let mut cabac = coder();
        cabac.init(&mut bs).unwrap();
        assert_eq!(
            Error::OutOfRange("value has no UEGk binarization"),
            binarization::ueg(&mut bs, &mut cabac, 0, 14, false, &[228], &mut -1).unwrap_err()
        );
        assert_eq!(
            Error::OutOfRange("value above its truncated unary maximum"),
            binarization::unary(&mut bs, &mut cabac, &[64], Some(3), &mut 4).unwrap_err()
        );
    }
}
