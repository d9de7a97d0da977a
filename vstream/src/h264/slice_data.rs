//! Slice data and macroblock layer (7.3.4, 7.3.5)
//!
//! These walk the grammar over the element functions of `mb` and
//! `residual`. When encoding, the current `Macroblock` record and its
//! `MacroblockData` hold what is coded; when decoding they receive it.

use crate::bitstream::{AlignMode, Bitstream};
use crate::cabac::Cabac;
use crate::error::{Error, Result};
use crate::h264::macroblock::Macroblock;
use crate::h264::mb;
use crate::h264::residual::{self, Residual};
use crate::h264::slice::{Neighbor, Slice, SliceFlags};
use crate::h264::types::{MbType, SliceType, SubMbType};
use log::{debug, trace};

/// Macroblock syntax that later macroblocks never look at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroblockData {
    /// `pcm_sample_luma`, in raster order.
    pub pcm_luma: [u16; 256],

    /// `pcm_sample_chroma`: all Cb samples, then all Cr samples.
    pub pcm_chroma: [u16; 512],

    /// `prev_intra4x4_pred_mode_flag`, or `prev_intra8x8_pred_mode_flag` in
    /// the first four entries.
    pub prev_intra_pred_mode_flag: [bool; 16],

    /// `rem_intra4x4_pred_mode` or `rem_intra8x8_pred_mode`, as above.
    pub rem_intra_pred_mode: [u8; 16],

    pub residual: Residual,
}

impl MacroblockData {
    pub fn new() -> Self {
        Self {
            pcm_luma: [0; 256],
            pcm_chroma: [0; 512],
            prev_intra_pred_mode_flag: [false; 16],
            rem_intra_pred_mode: [0; 16],
            residual: Residual::new(),
        }
    }
}

impl Default for MacroblockData {
    fn default() -> Self {
        Self::new()
    }
}

/// Partitions of a macroblock or sub-macroblock, as the first 8x8 quadrant
/// (or 4x4 block within a quadrant) of each and the ones it covers.
type Shape = &'static [(usize, &'static [usize])];

const WHOLE: Shape = &[(0, &[0, 1, 2, 3])];
const HALVES_16X8: Shape = &[(0, &[0, 1]), (2, &[2, 3])];
const HALVES_8X16: Shape = &[(0, &[0, 2]), (1, &[1, 3])];
const QUARTERS: Shape = &[(0, &[0]), (1, &[1]), (2, &[2]), (3, &[3])];

fn mb_shape(mb_type: MbType) -> Shape {
    match mb_type {
        MbType::P16x8 | MbType::B16x8(..) => HALVES_16X8,
        MbType::P8x16 | MbType::B8x16(..) => HALVES_8X16,
        _ => WHOLE,
    }
}

fn sub_shape(sub: SubMbType) -> Shape {
    match sub {
        SubMbType::P8x4 | SubMbType::B8x4(_) => HALVES_16X8,
        SubMbType::P4x8 | SubMbType::B4x8(_) => HALVES_8X16,
        SubMbType::P4x4 | SubMbType::B4x4(_) => QUARTERS,
        _ => WHOLE,
    }
}

/// Whether partition `part` of a 16x16, 16x8 or 8x16 macroblock predicts
/// from list `list`.
fn part_uses(mb_type: MbType, part: usize, list: usize) -> bool {
    match mb_type {
        MbType::P16x16 | MbType::P16x8 | MbType::P8x16 => list == 0,
        MbType::B16x16(pred) => pred.uses(list),
        MbType::B16x8(first, second) | MbType::B8x16(first, second) => {
            (if part == 0 { first } else { second }).uses(list)
        }
        _ => false,
    }
}

fn skip_type(slice_type: SliceType) -> Result<MbType> {
    match slice_type {
        SliceType::P | SliceType::SP => Ok(MbType::PSkip),
        SliceType::B => Ok(MbType::BSkip),
        _ => Err(Error::ContractViolation("intra slices have no skipped macroblocks")),
    }
}

/// 7.4.4: the `mb_field_decoding_flag` of a pair that codes none, taken
/// from the pair to the left, else the pair above, else frame.
fn inferred_field(slice: &Slice) -> bool {
    slice
        .neighbor_pair(Neighbor::A)
        .or_else(|| slice.neighbor_pair(Neighbor::B))
        .map_or(false, |addr| slice.grid()[addr].mb_field_decoding_flag)
}

/// `ref_idx_lX` with `max` the largest index allowed, inferred to be zero
/// when there is no choice.
fn ref_idx_or_zero(
    bs: &mut Bitstream,
    cabac: Option<&mut Cabac>,
    slice: &Slice,
    list: usize,
    b8: usize,
    max: u32,
    val: &mut u32,
) -> Result<()> {
    if max == 0 {
        bs.infer(val, 0)
    } else {
        mb::ref_idx(bs, cabac, slice, list, b8, max, val)
    }
}

/// The reference index an encoder was handed for a partition.
fn given_ref_idx(given: &Macroblock, list: usize, b8: usize) -> Result<u32> {
    given.ref_idx[list][b8].ok_or(Error::ContractViolation(
        "partition predicts from a list without a reference index",
    ))
}

/// Largest `ref_idx_lX` of the current macroblock. Field macroblocks of an
/// MBAFF frame address each field of a reference frame.
fn max_ref_idx(slice: &Slice, list: usize) -> u32 {
    let n = slice.params().num_ref_idx_active_minus1[list];
    if slice.params().flags.contains(SliceFlags::Mbaff) && slice.current().mb_field_decoding_flag {
        2 * n + 1
    } else {
        n
    }
}

/// Code both components of the motion vector difference of one partition,
/// whose first 4x4 block is `first`, and store them over `covered`.
fn mvd_pair(
    bs: &mut Bitstream,
    cabac: &mut Option<&mut Cabac>,
    slice: &mut Slice,
    given: &Macroblock,
    list: usize,
    first: usize,
    covered: impl Iterator<Item = usize> + Clone,
) -> Result<()> {
    for comp in 0..2 {
        let mut d = given.mvd[list][first][comp];
        mb::mvd(bs, cabac.as_deref_mut(), slice, list, first, comp, &mut d)?;

        for blk in covered.clone() {
            slice.current_mut().mvd[list][blk][comp] = d;
        }
    }

    Ok(())
}

/// 7.3.5.1 `mb_pred` for inter macroblocks other than `B_Direct_16x16`.
fn inter_pred(bs: &mut Bitstream, cabac: &mut Option<&mut Cabac>, slice: &mut Slice, given: &Macroblock) -> Result<()> {
    let mb_type = slice.current().mb_type;
    let shape = mb_shape(mb_type);
    let encoding = bs.is_encoding();

    for list in 0..2 {
        let max = max_ref_idx(slice, list);
        for (part, &(b8, quadrants)) in shape.iter().enumerate() {
            if !part_uses(mb_type, part, list) {
                continue;
            }

            let mut idx = if encoding { given_ref_idx(given, list, b8)? } else { 0 };
            ref_idx_or_zero(bs, cabac.as_deref_mut(), slice, list, b8, max, &mut idx)?;

            for &q in quadrants {
                slice.current_mut().ref_idx[list][q] = Some(idx);
            }
        }
    }

    for list in 0..2 {
        for (part, &(b8, quadrants)) in shape.iter().enumerate() {
            if part_uses(mb_type, part, list) {
                let covered = quadrants.iter().flat_map(|q| q * 4..q * 4 + 4);
                mvd_pair(bs, cabac, slice, given, list, b8 * 4, covered)?;
            }
        }
    }

    Ok(())
}

/// 7.3.5.2 `sub_mb_pred`. Yields `noSubMbPartSizeLessThan8x8Flag`.
fn sub_mb_pred(
    bs: &mut Bitstream,
    cabac: &mut Option<&mut Cabac>,
    slice: &mut Slice,
    given: &Macroblock,
) -> Result<bool> {
    let encoding = bs.is_encoding();
    let mb_type = slice.current().mb_type;
    let direct_inference = slice.params().flags.contains(SliceFlags::Direct8x8Inference);

    let mut subs = [SubMbType::P8x8; 4];
    for (b8, sub) in subs.iter_mut().enumerate() {
        if encoding {
            *sub = given.sub_mb_type[b8].ok_or(Error::ContractViolation("sub-macroblock without a type"))?;
        }
        mb::sub_mb_type(bs, cabac.as_deref_mut(), slice, sub)?;
        slice.current_mut().sub_mb_type[b8] = Some(*sub);
    }

    for list in 0..2 {
        let max = max_ref_idx(slice, list);
        for (b8, sub) in subs.iter().enumerate() {
            if sub.is_direct() || !sub.uses(list) {
                continue;
            }

            let mut idx = if encoding { given_ref_idx(given, list, b8)? } else { 0 };
            if mb_type == MbType::P8x8Ref0 {
                bs.infer(&mut idx, 0)?;
            } else {
                ref_idx_or_zero(bs, cabac.as_deref_mut(), slice, list, b8, max, &mut idx)?;
            }
            slice.current_mut().ref_idx[list][b8] = Some(idx);
        }
    }

    for list in 0..2 {
        for (b8, sub) in subs.iter().enumerate() {
            if sub.is_direct() || !sub.uses(list) {
                continue;
            }

            for &(b4, blocks) in sub_shape(*sub) {
                let covered = blocks.iter().map(move |b| b8 * 4 + b);
                mvd_pair(bs, cabac, slice, given, list, b8 * 4 + b4, covered)?;
            }
        }
    }

    Ok(subs.iter().all(|sub| {
        if sub.is_direct() {
            direct_inference
        } else {
            sub_shape(*sub).len() == 1
        }
    }))
}

/// 7.3.5.1 `mb_pred` for intra macroblocks other than `I_PCM`.
fn intra_pred(
    bs: &mut Bitstream,
    cabac: &mut Option<&mut Cabac>,
    slice: &mut Slice,
    given: &Macroblock,
    data: &mut MacroblockData,
) -> Result<()> {
    let current = slice.current();
    if !current.mb_type.is_i16x16() {
        let modes = if current.transform_size_8x8_flag { 4 } else { 16 };
        for i in 0..modes {
            let prev = &mut data.prev_intra_pred_mode_flag[i];
            mb::prev_intra_pred_mode_flag(bs, cabac.as_deref_mut(), prev)?;
            if !*prev {
                mb::rem_intra_pred_mode(bs, cabac.as_deref_mut(), &mut data.rem_intra_pred_mode[i])?;
            }
        }
    }

    let mut mode = given.intra_chroma_pred_mode;
    if matches!(slice.params().chroma_array_type, 1 | 2) {
        mb::intra_chroma_pred_mode(bs, cabac.as_deref_mut(), slice, &mut mode)?;
    } else {
        bs.infer(&mut mode, 0)?;
    }
    slice.current_mut().intra_chroma_pred_mode = mode;

    Ok(())
}

/// `pcm_sample_luma` and `pcm_sample_chroma`, between the zero alignment
/// bits before them and the arithmetic coder restart after them.
fn pcm_samples(
    bs: &mut Bitstream,
    cabac: Option<&mut Cabac>,
    slice: &Slice,
    data: &mut MacroblockData,
) -> Result<()> {
    let params = slice.params();
    let chroma = match params.chroma_array_type {
        1 => 128,
        2 => 256,
        3 => 512,
        _ => 0,
    };

    bs.align_byte(AlignMode::Zero)?;
    for sample in data.pcm_luma.iter_mut() {
        bs.u(sample, u32::from(params.bit_depth_luma))?;
    }
    for sample in data.pcm_chroma[..chroma].iter_mut() {
        bs.u(sample, u32::from(params.bit_depth_chroma))?;
    }

    if let Some(cabac) = cabac {
        cabac.init(bs)?;
    }

    Ok(())
}

/// `macroblock_layer` of the current macroblock.
///
/// The record's `mb_field_decoding_flag` must already be settled. Every
/// other field is coded or inferred here, and is rewritten from scratch
/// even when encoding, so that both directions leave the same record
/// behind.
pub fn macroblock_layer(
    bs: &mut Bitstream,
    mut cabac: Option<&mut Cabac>,
    slice: &mut Slice,
    data: &mut MacroblockData,
) -> Result<()> {
    let encoding = bs.is_encoding();
    let given = if encoding {
        slice.current().clone()
    } else {
        *data = MacroblockData::new();
        Macroblock::default()
    };
    let field = slice.current().mb_field_decoding_flag;
    let transform_8x8_mode = slice.params().flags.contains(SliceFlags::Transform8x8Mode);

    let mut mb_type = given.mb_type;
    mb::mb_type(bs, cabac.as_deref_mut(), slice, &mut mb_type)?;
    *slice.current_mut() = Macroblock {
        mb_field_decoding_flag: field,
        ..Macroblock::new(mb_type)
    };
    trace!("macroblock {} is {:?}", slice.curr_mb_addr(), mb_type);

    let mut qp_delta = given.mb_qp_delta;
    let mut transform_8x8 = given.transform_size_8x8_flag;

    if mb_type == MbType::IPcm {
        pcm_samples(bs, cabac, slice, data)?;

        let mut cbp = given.coded_block_pattern;
        let mut chroma_mode = given.intra_chroma_pred_mode;
        bs.infer(&mut qp_delta, 0)?;
        bs.infer(&mut transform_8x8, false)?;
        bs.infer(&mut cbp, 0x2f)?;
        bs.infer(&mut chroma_mode, 0)?;

        let current = slice.current_mut();
        current.coded_block_pattern = cbp;
        current.coded_block_flag = [[true; 17]; 3];
        return Ok(());
    }

    let mut no_sub_8x8 = true;
    if mb_type.has_sub_mb() {
        no_sub_8x8 = sub_mb_pred(bs, &mut cabac, slice, &given)?;
    } else {
        if mb_type == MbType::INxN && transform_8x8_mode {
            mb::transform_size_8x8_flag(bs, cabac.as_deref_mut(), slice, &mut transform_8x8)?;
            slice.current_mut().transform_size_8x8_flag = transform_8x8;
        }

        if mb_type.is_intra() {
            intra_pred(bs, &mut cabac, slice, &given, data)?;
        } else if mb_type != MbType::BDirect16x16 {
            inter_pred(bs, &mut cabac, slice, &given)?;
        }
    }
    if mb_type.is_inter() {
        let mut chroma_mode = given.intra_chroma_pred_mode;
        bs.infer(&mut chroma_mode, 0)?;
    }

    let mut cbp = given.coded_block_pattern;
    if let MbType::I16x16 {
        cbp_chroma,
        cbp_luma_all,
        ..
    } = mb_type
    {
        bs.infer(&mut cbp, (u32::from(cbp_chroma) << 4) | (15 * u32::from(cbp_luma_all)))?;
        slice.current_mut().coded_block_pattern = cbp;
        bs.infer(&mut transform_8x8, false)?;
    } else {
        mb::coded_block_pattern(bs, cabac.as_deref_mut(), slice, &mut cbp)?;
        slice.current_mut().coded_block_pattern = cbp;

        if mb_type.is_inter() {
            let direct_inference = slice.params().flags.contains(SliceFlags::Direct8x8Inference);
            if cbp & 0xf != 0
                && transform_8x8_mode
                && no_sub_8x8
                && (mb_type != MbType::BDirect16x16 || direct_inference)
            {
                mb::transform_size_8x8_flag(bs, cabac.as_deref_mut(), slice, &mut transform_8x8)?;
            } else {
                bs.infer(&mut transform_8x8, false)?;
            }
        } else if !transform_8x8_mode || mb_type != MbType::INxN {
            bs.infer(&mut transform_8x8, false)?;
        }
    }
    slice.current_mut().transform_size_8x8_flag = transform_8x8;

    if cbp != 0 || mb_type.is_i16x16() {
        mb::mb_qp_delta(bs, cabac.as_deref_mut(), slice, &mut qp_delta)?;
    } else {
        bs.infer(&mut qp_delta, 0)?;
    }
    slice.current_mut().mb_qp_delta = qp_delta;

    residual::residual(bs, cabac, slice, &mut data.residual, 0, 15)
}

/// Turn the current macroblock into a skipped one.
///
/// Only `mb_field_decoding_flag` is kept. When encoding, the record must
/// already be a skipped macroblock with nothing coded.
pub fn infer_skip(bs: &mut Bitstream, slice: &mut Slice) -> Result<()> {
    let skip_type = skip_type(slice.params().slice_type)?;
    let mut mb = if bs.is_encoding() {
        slice.current().clone()
    } else {
        Macroblock::default()
    };

    bs.infer(&mut mb.mb_type, skip_type)?;
    bs.infer(&mut mb.mb_qp_delta, 0)?;
    bs.infer(&mut mb.transform_size_8x8_flag, false)?;
    bs.infer(&mut mb.coded_block_pattern, 0)?;
    bs.infer(&mut mb.intra_chroma_pred_mode, 0)?;

    let field = slice.current().mb_field_decoding_flag;
    *slice.current_mut() = Macroblock {
        mb_field_decoding_flag: field,
        ..Macroblock::new(skip_type)
    };

    Ok(())
}

/// `slice_data`: every macroblock of the slice, from `first_mb_in_slice` to
/// `last_mb`, including the byte alignment ahead of CABAC data and the
/// trailing bits at the end.
///
/// `data` holds one entry per macroblock of the picture. `last_mb` is the
/// address of the final macroblock, which the decoder reports. Under MBAFF
/// it must be the bottom of a pair, and when encoding both macroblocks of a
/// pair must carry the same `mb_field_decoding_flag`.
pub fn slice_data(
    bs: &mut Bitstream,
    mut cabac: Option<&mut Cabac>,
    slice: &mut Slice,
    data: &mut [MacroblockData],
    last_mb: &mut usize,
) -> Result<()> {
    if data.len() != slice.grid().len() {
        return Err(Error::ContractViolation("macroblock data does not match the picture"));
    }

    let encoding = bs.is_encoding();
    let params = *slice.params();
    let mbaff = params.flags.contains(SliceFlags::Mbaff);
    if encoding && (*last_mb < slice.curr_mb_addr() || *last_mb >= data.len() || (mbaff && *last_mb % 2 == 0)) {
        return Err(Error::OutOfRange("last macroblock outside of the slice"));
    }

    let skip_type = match params.slice_type {
        SliceType::I | SliceType::SI => None,
        slice_type => Some(skip_type(slice_type)?),
    };

    if let Some(cabac) = cabac.as_deref_mut() {
        bs.align_byte(AlignMode::One)?;
        cabac.init(bs)?;
    }

    let mut pair_field = false;
    let mut top_skipped = false;
    let mut run_left = 0u32;
    let mut expect_run = true;
    let mut more_data = true;

    loop {
        let addr = slice.curr_mb_addr();
        let top = mbaff && addr % 2 == 0;
        let bottom = mbaff && !top;

        if top {
            if encoding {
                pair_field = slice.current().mb_field_decoding_flag;
                if slice.grid().get(addr + 1).map(|mb| mb.mb_field_decoding_flag) != Some(pair_field) {
                    return Err(Error::ContractViolation("macroblocks of a pair differ in field decoding"));
                }
            }
            // Contexts ahead of the coded flag see the inferred one.
            let inferred = inferred_field(slice);
            slice.set_field_decoding(inferred);
        } else if !mbaff {
            let mut field = encoding && slice.current().mb_field_decoding_flag;
            bs.infer(&mut field, params.flags.contains(SliceFlags::FieldPic))?;
            slice.set_field_decoding(field);
        }

        let skipped = match (skip_type, cabac.as_deref_mut()) {
            (None, _) => false,
            (Some(skip_type), Some(cabac)) => {
                let mut skipped = encoding && slice.current().mb_type == skip_type;
                mb::mb_skip_flag(bs, Some(cabac), slice, &mut skipped)?;
                skipped
            }
            (Some(_), None) if run_left > 0 => {
                run_left -= 1;
                true
            }
            (Some(skip_type), None) if expect_run => {
                expect_run = false;

                let mut run = 0;
                if encoding {
                    let mut at = Some(addr);
                    while let Some(a) = at.filter(|&a| slice.grid()[a].mb_type == skip_type) {
                        run += 1;
                        at = if a == *last_mb { None } else { slice.next_mb_addr(a) };
                    }
                }
                mb::mb_skip_run(bs, &mut run)?;

                if run > 0 && !encoding {
                    more_data = bs.has_more_data()?;
                }
                run_left = run.saturating_sub(1);
                run > 0
            }
            (Some(_), None) => false,
        };

        if skipped {
            infer_skip(bs, slice)?;
            if !encoding {
                data[addr] = MacroblockData::new();
            }

            if bottom && top_skipped {
                let mut field = pair_field;
                bs.infer(&mut field, slice.current().mb_field_decoding_flag)?;
                pair_field = field;
                slice.set_field_decoding(field);
            }
        } else {
            if top || (bottom && top_skipped) {
                mb::mb_field_decoding_flag(bs, cabac.as_deref_mut(), slice, &mut pair_field)?;
                slice.set_field_decoding(pair_field);
            }

            macroblock_layer(bs, cabac.as_deref_mut(), slice, &mut data[addr])?;
            expect_run = true;
        }

        let last = match cabac.as_deref_mut() {
            Some(_) if top => false,
            Some(cabac) => {
                let mut end = encoding && addr == *last_mb;
                mb::end_of_slice_flag(bs, Some(cabac), &mut end)?;
                end
            }
            None if encoding => addr == *last_mb,
            None if skipped => run_left == 0 && !more_data,
            None => !bs.has_more_data()?,
        };

        if last {
            if top {
                return Err(Error::Desync("slice ends inside a macroblock pair"));
            }

            if cabac.is_some() {
                bs.align_byte(AlignMode::Zero)?;
            } else {
                bs.end()?;
            }
            *last_mb = addr;
            debug!("slice data ends at macroblock {}", addr);
            return Ok(());
        }

        if top {
            top_skipped = skipped;
        }
        slice.advance()?;
    }
}
