//! Macroblock layer syntax elements (7.3.5)

use crate::bitstream::Bitstream;
use crate::cabac::Cabac;
use crate::error::{Error, Result};
use crate::h264::binarization::{self, BinString, Leaf, SlotMap};
use crate::h264::ctxidx;
use crate::h264::macroblock::Macroblock;
use crate::h264::slice::{BlockSize, Neighbor, Slice, SliceFlags};
use crate::h264::types::{MbType, Pred, SliceType, SubMbType};

macro_rules! i16x16 {
    ($pred:literal, 0, $luma:literal) => {
        BinString {
            leaf: Leaf::Value(MbType::I16x16 {
                pred_mode: $pred,
                cbp_chroma: 0,
                cbp_luma_all: $luma,
            }),
            bins: &[
                (0, true),
                (1, false),
                (2, $luma),
                (3, false),
                (5, $pred >> 1 == 1),
                (6, $pred & 1 == 1),
            ],
        }
    };
    ($pred:literal, $chroma:literal, $luma:literal) => {
        BinString {
            leaf: Leaf::Value(MbType::I16x16 {
                pred_mode: $pred,
                cbp_chroma: $chroma,
                cbp_luma_all: $luma,
            }),
            bins: &[
                (0, true),
                (1, false),
                (2, $luma),
                (3, true),
                (4, $chroma == 2),
                (5, $pred >> 1 == 1),
                (6, $pred & 1 == 1),
            ],
        }
    };
}

/// Figure 9-37 (a) and table 9-36: `mb_type` in I slices, and the intra
/// suffix in all others.
///
/// Slot 0 is the first bin, slot 1 the terminating bin that separates
/// `I_PCM`, and slots 2 to 6 the bins of the Intra 16x16 fields.
static I_TREE: [BinString<MbType>; 26] = [
    BinString {
        leaf: Leaf::Value(MbType::INxN),
        bins: &[(0, false)],
    },
    i16x16!(0, 0, false),
    i16x16!(1, 0, false),
    i16x16!(2, 0, false),
    i16x16!(3, 0, false),
    i16x16!(0, 1, false),
    i16x16!(1, 1, false),
    i16x16!(2, 1, false),
    i16x16!(3, 1, false),
    i16x16!(0, 2, false),
    i16x16!(1, 2, false),
    i16x16!(2, 2, false),
    i16x16!(3, 2, false),
    i16x16!(0, 0, true),
    i16x16!(1, 0, true),
    i16x16!(2, 0, true),
    i16x16!(3, 0, true),
    i16x16!(0, 1, true),
    i16x16!(1, 1, true),
    i16x16!(2, 1, true),
    i16x16!(3, 1, true),
    i16x16!(0, 2, true),
    i16x16!(1, 2, true),
    i16x16!(2, 2, true),
    i16x16!(3, 2, true),
    BinString {
        leaf: Leaf::Value(MbType::IPcm),
        bins: &[(0, true), (1, true)],
    },
];

/// The `SI` prefix. Slot 7.
static SI_TREE: [BinString<MbType>; 2] = [
    BinString {
        leaf: Leaf::Value(MbType::Si),
        bins: &[(7, false)],
    },
    BinString {
        leaf: Leaf::Nested(&I_TREE),
        bins: &[(7, true)],
    },
];

/// Table 9-37 (b): P and SP prefixes, slots 7 to 10.
static P_TREE: [BinString<MbType>; 5] = [
    BinString {
        leaf: Leaf::Value(MbType::P16x16),
        bins: &[(7, false), (8, false), (9, false)],
    },
    BinString {
        leaf: Leaf::Value(MbType::P8x8),
        bins: &[(7, false), (8, false), (9, true)],
    },
    BinString {
        leaf: Leaf::Value(MbType::P8x16),
        bins: &[(7, false), (8, true), (10, false)],
    },
    BinString {
        leaf: Leaf::Value(MbType::P16x8),
        bins: &[(7, false), (8, true), (10, true)],
    },
    BinString {
        leaf: Leaf::Nested(&I_TREE),
        bins: &[(7, true)],
    },
];

macro_rules! b_string {
    ($mb_type:expr, [$($bin:expr),*]) => {
        BinString {
            leaf: Leaf::Value($mb_type),
            bins: &[(7, true), (8, true), $($bin),*],
        }
    };
}

/// Table 9-37 (b): B prefixes. Slot 7 is the first bin, slot 8 the second,
/// slot 9 the third after a second bin of one, and slot 10 every other.
static B_TREE: [BinString<MbType>; 24] = [
    BinString {
        leaf: Leaf::Value(MbType::BDirect16x16),
        bins: &[(7, false)],
    },
    BinString {
        leaf: Leaf::Value(MbType::B16x16(Pred::L0)),
        bins: &[(7, true), (8, false), (10, false)],
    },
    BinString {
        leaf: Leaf::Value(MbType::B16x16(Pred::L1)),
        bins: &[(7, true), (8, false), (10, true)],
    },
    b_string!(MbType::B16x16(Pred::Bi), [(9, false), (10, false), (10, false), (10, false)]),
    b_string!(MbType::B16x8(Pred::L0, Pred::L0), [(9, false), (10, false), (10, false), (10, true)]),
    b_string!(MbType::B8x16(Pred::L0, Pred::L0), [(9, false), (10, false), (10, true), (10, false)]),
    b_string!(MbType::B16x8(Pred::L1, Pred::L1), [(9, false), (10, false), (10, true), (10, true)]),
    b_string!(MbType::B8x16(Pred::L1, Pred::L1), [(9, false), (10, true), (10, false), (10, false)]),
    b_string!(MbType::B16x8(Pred::L0, Pred::L1), [(9, false), (10, true), (10, false), (10, true)]),
    b_string!(MbType::B8x16(Pred::L0, Pred::L1), [(9, false), (10, true), (10, true), (10, false)]),
    b_string!(MbType::B16x8(Pred::L1, Pred::L0), [(9, false), (10, true), (10, true), (10, true)]),
    b_string!(MbType::B16x8(Pred::L0, Pred::Bi), [(9, true), (10, false), (10, false), (10, false), (10, false)]),
    b_string!(MbType::B8x16(Pred::L0, Pred::Bi), [(9, true), (10, false), (10, false), (10, false), (10, true)]),
    b_string!(MbType::B16x8(Pred::L1, Pred::Bi), [(9, true), (10, false), (10, false), (10, true), (10, false)]),
    b_string!(MbType::B8x16(Pred::L1, Pred::Bi), [(9, true), (10, false), (10, false), (10, true), (10, true)]),
    b_string!(MbType::B16x8(Pred::Bi, Pred::L0), [(9, true), (10, false), (10, true), (10, false), (10, false)]),
    b_string!(MbType::B8x16(Pred::Bi, Pred::L0), [(9, true), (10, false), (10, true), (10, false), (10, true)]),
    b_string!(MbType::B16x8(Pred::Bi, Pred::L1), [(9, true), (10, false), (10, true), (10, true), (10, false)]),
    b_string!(MbType::B8x16(Pred::Bi, Pred::L1), [(9, true), (10, false), (10, true), (10, true), (10, true)]),
    b_string!(MbType::B16x8(Pred::Bi, Pred::Bi), [(9, true), (10, true), (10, false), (10, false), (10, false)]),
    b_string!(MbType::B8x16(Pred::Bi, Pred::Bi), [(9, true), (10, true), (10, false), (10, false), (10, true)]),
    BinString {
        leaf: Leaf::Nested(&I_TREE),
        bins: &[(7, true), (8, true), (9, true), (10, true), (10, false), (10, true)],
    },
    b_string!(MbType::B8x16(Pred::L1, Pred::L0), [(9, true), (10, true), (10, true), (10, false)]),
    b_string!(MbType::B8x8, [(9, true), (10, true), (10, true), (10, true)]),
];

/// Table 9-38: `sub_mb_type` in P and SP slices, slots 0 to 2.
static SUB_P_TREE: [BinString<SubMbType>; 4] = [
    BinString {
        leaf: Leaf::Value(SubMbType::P8x8),
        bins: &[(0, true)],
    },
    BinString {
        leaf: Leaf::Value(SubMbType::P8x4),
        bins: &[(0, false), (1, false)],
    },
    BinString {
        leaf: Leaf::Value(SubMbType::P4x4),
        bins: &[(0, false), (1, true), (2, false)],
    },
    BinString {
        leaf: Leaf::Value(SubMbType::P4x8),
        bins: &[(0, false), (1, true), (2, true)],
    },
];

macro_rules! sub_b_string {
    ($sub:expr, [$($bin:expr),*]) => {
        BinString {
            leaf: Leaf::Value($sub),
            bins: &[(0, true), (1, true), $($bin),*],
        }
    };
}

/// Table 9-38: `sub_mb_type` in B slices. Slot 0 is the first bin, slot 1
/// the second, slot 2 the third after a second bin of one, and slot 3 every
/// other.
static SUB_B_TREE: [BinString<SubMbType>; 13] = [
    BinString {
        leaf: Leaf::Value(SubMbType::BDirect8x8),
        bins: &[(0, false)],
    },
    BinString {
        leaf: Leaf::Value(SubMbType::B8x8(Pred::L0)),
        bins: &[(0, true), (1, false), (3, false)],
    },
    BinString {
        leaf: Leaf::Value(SubMbType::B8x8(Pred::L1)),
        bins: &[(0, true), (1, false), (3, true)],
    },
    sub_b_string!(SubMbType::B8x8(Pred::Bi), [(2, false), (3, false), (3, false)]),
    sub_b_string!(SubMbType::B8x4(Pred::L0), [(2, false), (3, false), (3, true)]),
    sub_b_string!(SubMbType::B4x8(Pred::L0), [(2, false), (3, true), (3, false)]),
    sub_b_string!(SubMbType::B8x4(Pred::L1), [(2, false), (3, true), (3, true)]),
    sub_b_string!(SubMbType::B4x8(Pred::L1), [(2, true), (3, false), (3, false), (3, false)]),
    sub_b_string!(SubMbType::B8x4(Pred::Bi), [(2, true), (3, false), (3, false), (3, true)]),
    sub_b_string!(SubMbType::B4x8(Pred::Bi), [(2, true), (3, false), (3, true), (3, false)]),
    sub_b_string!(SubMbType::B4x4(Pred::L0), [(2, true), (3, false), (3, true), (3, true)]),
    sub_b_string!(SubMbType::B4x4(Pred::L1), [(2, true), (3, true), (3, false)]),
    sub_b_string!(SubMbType::B4x4(Pred::Bi), [(2, true), (3, true), (3, true)]),
];

/// Table 9-4 `me(v)` mapping with chroma: coded block pattern per codeNum,
/// for Intra 4x4/8x8 and for inter macroblocks.
const CBP_CHROMA: [[u8; 2]; 48] = [
    [47, 0], [31, 16], [15, 1], [0, 2], [23, 4], [27, 8], [29, 32], [30, 3],
    [7, 5], [11, 10], [13, 12], [14, 15], [39, 47], [43, 7], [45, 11], [46, 13],
    [16, 14], [3, 6], [5, 9], [10, 31], [12, 35], [19, 37], [21, 42], [26, 44],
    [28, 33], [35, 34], [37, 36], [42, 40], [44, 39], [1, 43], [2, 45], [4, 46],
    [8, 17], [17, 18], [18, 20], [20, 24], [24, 19], [6, 21], [9, 26], [22, 28],
    [25, 23], [32, 27], [33, 29], [34, 30], [36, 22], [40, 25], [38, 38], [41, 41],
];

/// Table 9-4 `me(v)` mapping for monochrome and 4:4:4 video.
const CBP_MONO: [[u8; 2]; 16] = [
    [15, 0], [0, 1], [7, 2], [11, 4], [13, 8], [14, 3], [3, 5], [5, 10],
    [10, 12], [12, 15], [1, 7], [2, 11], [4, 13], [8, 14], [6, 6], [9, 9],
];

const T: usize = ctxidx::TERMINATE;

/// Count the A and B neighbors of the current macroblock for which `cond`
/// holds, as `(condTermFlagA, condTermFlagB)`.
fn cond_terms(slice: &Slice, cond: impl Fn(&Macroblock) -> bool) -> (usize, usize) {
    (
        usize::from(cond(slice.neighbor_mb(Neighbor::A))),
        usize::from(cond(slice.neighbor_mb(Neighbor::B))),
    )
}

fn cabac_only<'c>(cabac: Option<&'c mut Cabac>, what: &'static str) -> Result<&'c mut Cabac> {
    cabac.ok_or(Error::ContractViolation(what))
}

/// `mb_skip_flag`, coded with CABAC in P, SP and B slices.
pub fn mb_skip_flag(bs: &mut Bitstream, cabac: Option<&mut Cabac>, slice: &Slice, val: &mut bool) -> Result<()> {
    let cabac = cabac_only(cabac, "mb_skip_flag is only coded with CABAC")?;
    let base = match slice.params().slice_type {
        SliceType::P | SliceType::SP => ctxidx::MB_SKIP_FLAG_P,
        SliceType::B => ctxidx::MB_SKIP_FLAG_B,
        _ => return Err(Error::ContractViolation("intra slices have no skipped macroblocks")),
    };

    let (a, b) = cond_terms(slice, |mb| mb.mb_type.is_available() && !mb.mb_type.is_skip());
    cabac.decision(bs, base + a + b, val)
}

/// `mb_skip_run`, coded with CAVLC.
pub fn mb_skip_run(bs: &mut Bitstream, val: &mut u32) -> Result<()> {
    bs.ue(val)
}

/// `end_of_slice_flag`, coded with CABAC.
///
/// A flag of one ends arithmetic coding; the caller follows it with the
/// rbsp trailing zero bits.
pub fn end_of_slice_flag(bs: &mut Bitstream, cabac: Option<&mut Cabac>, val: &mut bool) -> Result<()> {
    cabac_only(cabac, "end_of_slice_flag is only coded with CABAC")?.terminate(bs, val)
}

/// `mb_field_decoding_flag`
pub fn mb_field_decoding_flag(
    bs: &mut Bitstream,
    cabac: Option<&mut Cabac>,
    slice: &Slice,
    val: &mut bool,
) -> Result<()> {
    let Some(cabac) = cabac else {
        return bs.bit(val);
    };

    let field_pair = |pos: Neighbor| {
        slice
            .neighbor_pair(pos)
            .map_or(false, |addr| slice.grid()[addr].mb_field_decoding_flag)
    };
    let inc = usize::from(field_pair(Neighbor::A)) + usize::from(field_pair(Neighbor::B));

    cabac.decision(bs, ctxidx::MB_FIELD_DECODING_FLAG + inc, val)
}

/// `mb_type` of the current macroblock, under the slice's type.
///
/// Skipped macroblocks have no `mb_type`; asking to encode one is an
/// error.
pub fn mb_type(bs: &mut Bitstream, cabac: Option<&mut Cabac>, slice: &Slice, val: &mut MbType) -> Result<()> {
    let slice_type = slice.params().slice_type;

    let Some(cabac) = cabac else {
        let mut raw = 0;
        if bs.is_encoding() {
            raw = val.to_raw(slice_type)?;
        }

        bs.ue(&mut raw)?;
        *val = MbType::from_raw(slice_type, raw)?;
        return Ok(());
    };

    let (a, b) = cond_terms(slice, |mb| mb.mb_type.is_available() && mb.mb_type != MbType::INxN);
    let i = ctxidx::MB_TYPE_I;
    let i_first = i + a + b;

    let (tree, slots): (&'static [BinString<MbType>], SlotMap) = match slice_type {
        SliceType::I => (&I_TREE, [i_first, T, i + 3, i + 4, i + 5, i + 6, i + 7, 0, 0, 0, 0]),
        SliceType::SI => {
            let (a, b) = cond_terms(slice, |mb| mb.mb_type.is_available() && mb.mb_type != MbType::Si);
            let prefix = ctxidx::MB_TYPE_SI_PREFIX + a + b;

            (&SI_TREE, [i_first, T, i + 3, i + 4, i + 5, i + 6, i + 7, prefix, 0, 0, 0])
        }
        SliceType::P | SliceType::SP => {
            let p = ctxidx::MB_TYPE_P_PREFIX;
            let s = ctxidx::MB_TYPE_P_SUFFIX;

            (&P_TREE, [s, T, s + 1, s + 2, s + 2, s + 3, s + 3, p, p + 1, p + 2, p + 3])
        }
        SliceType::B => {
            let (a, b) = cond_terms(slice, |mb| mb.mb_type.is_available() && !mb.mb_type.is_direct());
            let p = ctxidx::MB_TYPE_B_PREFIX;
            let s = ctxidx::MB_TYPE_B_SUFFIX;

            (&B_TREE, [s, T, s + 1, s + 2, s + 2, s + 3, s + 3, p + a + b, p + 3, p + 4, p + 5])
        }
    };

    binarization::tree(bs, cabac, tree, &slots, val)
}

/// `sub_mb_type`
pub fn sub_mb_type(
    bs: &mut Bitstream,
    cabac: Option<&mut Cabac>,
    slice: &Slice,
    val: &mut SubMbType,
) -> Result<()> {
    let slice_type = slice.params().slice_type;

    let Some(cabac) = cabac else {
        let mut raw = 0;
        if bs.is_encoding() {
            raw = val.to_raw(slice_type)?;
        }

        bs.ue(&mut raw)?;
        *val = SubMbType::from_raw(slice_type, raw)?;
        return Ok(());
    };

    let p = ctxidx::SUB_MB_TYPE_P;
    let b = ctxidx::SUB_MB_TYPE_B;
    let (tree, slots): (&'static [BinString<SubMbType>], SlotMap) = match slice_type {
        SliceType::P | SliceType::SP => (&SUB_P_TREE, [p, p + 1, p + 2, 0, 0, 0, 0, 0, 0, 0, 0]),
        SliceType::B => (&SUB_B_TREE, [b, b + 1, b + 2, b + 3, 0, 0, 0, 0, 0, 0, 0]),
        _ => return Err(Error::OutOfRange("sub_mb_type not allowed in this slice type")),
    };

    binarization::tree(bs, cabac, tree, &slots, val)
}

/// `coded_block_pattern` of the current macroblock, whose type must be set.
pub fn coded_block_pattern(
    bs: &mut Bitstream,
    cabac: Option<&mut Cabac>,
    slice: &Slice,
    val: &mut u32,
) -> Result<()> {
    let mb_type = slice.current().mb_type;
    if matches!(mb_type, MbType::I16x16 { .. } | MbType::IPcm) {
        return Err(Error::ContractViolation("coded_block_pattern is implied by the macroblock type"));
    }

    let has_chroma = matches!(slice.params().chroma_array_type, 1 | 2);

    let Some(cabac) = cabac else {
        let table: &[[u8; 2]] = if has_chroma { &CBP_CHROMA } else { &CBP_MONO };
        let column = usize::from(!matches!(mb_type, MbType::INxN | MbType::Si));

        let mut code_num = 0;
        if bs.is_encoding() {
            code_num = table
                .iter()
                .position(|entry| u32::from(entry[column]) == *val)
                .ok_or(Error::OutOfRange("coded_block_pattern out of range"))? as u32;
        }

        bs.ue(&mut code_num)?;
        *val = table
            .get(code_num as usize)
            .map(|entry| u32::from(entry[column]))
            .ok_or(Error::OutOfRange("coded_block_pattern codeNum out of range"))?;
        return Ok(());
    };

    if bs.is_encoding() && *val > if has_chroma { 0x2f } else { 0x0f } {
        return Err(Error::OutOfRange("coded_block_pattern out of range"));
    }

    let mut luma = 0;
    for b8 in 0..4 {
        let cond = |pos: Neighbor, internal: bool| {
            if internal {
                let b8_n = if pos == Neighbor::A { b8 - 1 } else { b8 - 2 };
                return usize::from((luma >> b8_n) & 1 == 0);
            }

            let (mb, b8_n) = slice.neighbor_block(pos, BlockSize::Luma8x8, b8);
            usize::from(match mb.mb_type {
                MbType::Unavailable | MbType::IPcm => false,
                MbType::PSkip | MbType::BSkip => true,
                _ => (mb.cbp_luma() >> b8_n) & 1 == 0,
            })
        };

        let a = cond(Neighbor::A, b8 % 2 == 1);
        let b = cond(Neighbor::B, b8 >= 2);

        let mut bin = (*val >> b8) & 1 == 1;
        cabac.decision(bs, ctxidx::CODED_BLOCK_PATTERN_LUMA + a + 2 * b, &mut bin)?;
        luma |= u32::from(bin) << b8;
    }

    let mut chroma = 0;
    if has_chroma {
        let chroma_cond = |mb: &Macroblock, threshold: u32| match mb.mb_type {
            MbType::Unavailable | MbType::PSkip | MbType::BSkip => false,
            MbType::IPcm => true,
            _ => mb.cbp_chroma() >= threshold,
        };

        let (a, b) = cond_terms(slice, |mb| chroma_cond(mb, 1));
        let mut bin = *val >> 4 != 0;
        cabac.decision(bs, ctxidx::CODED_BLOCK_PATTERN_CHROMA + a + 2 * b, &mut bin)?;

        if bin {
            let (a, b) = cond_terms(slice, |mb| chroma_cond(mb, 2));
            let mut second = *val >> 4 == 2;
            cabac.decision(bs, ctxidx::CODED_BLOCK_PATTERN_CHROMA + 4 + a + 2 * b, &mut second)?;
            chroma = 1 + u32::from(second);
        }
    }

    *val = luma | (chroma << 4);
    Ok(())
}

/// `transform_size_8x8_flag`
pub fn transform_size_8x8_flag(
    bs: &mut Bitstream,
    cabac: Option<&mut Cabac>,
    slice: &Slice,
    val: &mut bool,
) -> Result<()> {
    let Some(cabac) = cabac else {
        return bs.bit(val);
    };

    let (a, b) = cond_terms(slice, |mb| mb.transform_size_8x8_flag);
    cabac.decision(bs, ctxidx::TRANSFORM_SIZE_8X8_FLAG + a + b, val)
}

/// `mb_qp_delta`
pub fn mb_qp_delta(bs: &mut Bitstream, cabac: Option<&mut Cabac>, slice: &Slice, val: &mut i32) -> Result<()> {
    let Some(cabac) = cabac else {
        return bs.se(val);
    };

    let prev_delta = slice.prev().map_or(false, |mb| {
        !mb.mb_type.is_skip()
            && mb.mb_type != MbType::IPcm
            && (mb.mb_type.is_i16x16() || mb.coded_block_pattern != 0)
            && mb.mb_qp_delta != 0
    });

    let mut mapped = 0u32;
    if bs.is_encoding() {
        let delta = i64::from(*val);
        mapped = u32::try_from(if delta > 0 { 2 * delta - 1 } else { -2 * delta })
            .map_err(|_| Error::OutOfRange("mb_qp_delta out of range"))?;
    }

    let first = ctxidx::MB_QP_DELTA + usize::from(prev_delta);
    binarization::unary(
        bs,
        cabac,
        &[first, ctxidx::MB_QP_DELTA + 2, ctxidx::MB_QP_DELTA + 3],
        None,
        &mut mapped,
    )?;

    let mapped = i64::from(mapped);
    *val = i32::try_from(if mapped % 2 == 1 {
        (mapped + 1) / 2
    } else {
        -(mapped / 2)
    })
    .map_err(|_| Error::OutOfRange("mb_qp_delta out of range"))?;

    Ok(())
}

/// `prev_intra4x4_pred_mode_flag` and `prev_intra8x8_pred_mode_flag`
pub fn prev_intra_pred_mode_flag(bs: &mut Bitstream, cabac: Option<&mut Cabac>, val: &mut bool) -> Result<()> {
    match cabac {
        None => bs.bit(val),
        Some(cabac) => cabac.decision(bs, ctxidx::PREV_INTRA_PRED_MODE_FLAG, val),
    }
}

/// `rem_intra4x4_pred_mode` and `rem_intra8x8_pred_mode`
pub fn rem_intra_pred_mode(bs: &mut Bitstream, cabac: Option<&mut Cabac>, val: &mut u8) -> Result<()> {
    let Some(cabac) = cabac else {
        return bs.u(val, 3);
    };

    if bs.is_encoding() && *val > 7 {
        return Err(Error::OutOfRange("value does not fit in its field"));
    }

    let mut mode = 0;
    for i in 0..3 {
        let mut bin = (*val >> i) & 1 == 1;
        cabac.decision(bs, ctxidx::REM_INTRA_PRED_MODE, &mut bin)?;
        mode |= u8::from(bin) << i;
    }

    *val = mode;
    Ok(())
}

/// `intra_chroma_pred_mode`
pub fn intra_chroma_pred_mode(
    bs: &mut Bitstream,
    cabac: Option<&mut Cabac>,
    slice: &Slice,
    val: &mut u32,
) -> Result<()> {
    if bs.is_encoding() && *val > 3 {
        return Err(Error::OutOfRange("intra_chroma_pred_mode above 3"));
    }

    match cabac {
        None => bs.ue(val)?,
        Some(cabac) => {
            let (a, b) = cond_terms(slice, |mb| {
                mb.mb_type.is_intra() && mb.mb_type != MbType::IPcm && mb.intra_chroma_pred_mode != 0
            });
            let base = ctxidx::INTRA_CHROMA_PRED_MODE;

            binarization::unary(bs, cabac, &[base + a + b, base + 3], Some(3), val)?;
        }
    }

    if *val > 3 {
        return Err(Error::OutOfRange("intra_chroma_pred_mode above 3"));
    }

    Ok(())
}

/// Whether the 8x8 quadrant `b8` of `mb` is predicted directly.
fn is_direct_quadrant(mb: &Macroblock, b8: usize) -> bool {
    mb.mb_type.is_direct()
        || (mb.mb_type == MbType::B8x8 && mb.sub_mb_type[b8].map_or(false, |sub| sub.is_direct()))
}

/// Whether `mb` carries motion for list `list` in quadrant `b8`.
fn has_motion(mb: &Macroblock, list: usize, b8: usize) -> bool {
    mb.mb_type.is_inter()
        && !mb.mb_type.is_skip()
        && !is_direct_quadrant(mb, b8)
        && mb.ref_idx[list][b8].is_some()
}

/// `ref_idx_l0` or `ref_idx_l1` of the partition whose top left sample lies
/// in 8x8 quadrant `b8`, with `max` the largest index allowed.
pub fn ref_idx(
    bs: &mut Bitstream,
    cabac: Option<&mut Cabac>,
    slice: &Slice,
    list: usize,
    b8: usize,
    max: u32,
    val: &mut u32,
) -> Result<()> {
    let out_of_range = Error::OutOfRange("reference index above the list size");
    if bs.is_encoding() && *val > max {
        return Err(out_of_range);
    }

    match cabac {
        None => match max {
            0 => bs.infer(val, 0)?,
            1 => {
                let mut bit = *val == 0;
                bs.bit(&mut bit)?;
                *val = u32::from(!bit);
            }
            _ => bs.ue(val)?,
        },
        Some(cabac) => {
            let mbaff_frame = slice.params().flags.contains(SliceFlags::Mbaff)
                && !slice.current().mb_field_decoding_flag;

            let cond = |pos: Neighbor| {
                let (mb, idx) = slice.neighbor_block(pos, BlockSize::Luma8x8, b8);
                let threshold = if mbaff_frame && mb.mb_field_decoding_flag { 1 } else { 0 };

                usize::from(has_motion(mb, list, idx) && mb.ref_idx[list][idx].map_or(false, |r| r > threshold))
            };

            let first = ctxidx::REF_IDX + cond(Neighbor::A) + 2 * cond(Neighbor::B);
            binarization::unary(bs, cabac, &[first, ctxidx::REF_IDX + 4, ctxidx::REF_IDX + 5], None, val)?;
        }
    }

    if *val > max {
        return Err(out_of_range);
    }

    Ok(())
}

/// `mvd_l0` or `mvd_l1` component `comp` (0 horizontal, 1 vertical) of the
/// partition whose top left sample lies in 4x4 block `blk`.
pub fn mvd(
    bs: &mut Bitstream,
    cabac: Option<&mut Cabac>,
    slice: &Slice,
    list: usize,
    blk: usize,
    comp: usize,
    val: &mut i32,
) -> Result<()> {
    let Some(cabac) = cabac else {
        return bs.se(val);
    };

    let mbaff = slice.params().flags.contains(SliceFlags::Mbaff);
    let curr_field = slice.current().mb_field_decoding_flag;

    let abs_mvd = |pos: Neighbor| {
        let (mb, idx) = slice.neighbor_block(pos, BlockSize::Luma4x4, blk);
        if !has_motion(mb, list, idx / 4) {
            return 0;
        }

        let abs = mb.mvd[list][idx][comp].unsigned_abs();
        match (comp, mbaff, curr_field, mb.mb_field_decoding_flag) {
            (1, true, false, true) => abs * 2,
            (1, true, true, false) => abs / 2,
            _ => abs,
        }
    };

    let sum = abs_mvd(Neighbor::A) + abs_mvd(Neighbor::B);
    let inc = match sum {
        0..=2 => 0,
        3..=32 => 1,
        _ => 2,
    };

    let base = if comp == 0 { ctxidx::MVD_X } else { ctxidx::MVD_Y };
    binarization::ueg(
        bs,
        cabac,
        3,
        9,
        true,
        &[base + inc, base + 3, base + 4, base + 5, base + 6],
        val,
    )
}
