//! Residual data (7.3.5.3)

use crate::bitstream::Bitstream;
use crate::cabac::Cabac;
use crate::error::{Error, Result};
use crate::h264::binarization;
use crate::h264::cavlc::{self, CoeffToken, TotalZerosTable};
use crate::h264::ctxidx;
use crate::h264::macroblock::Macroblock;
use crate::h264::slice::{BlockSize, Neighbor, Slice};
use crate::h264::types::{BlockCat, MbType};

/// The coefficient levels of one macroblock, in scan order.
///
/// Planes 1 and 2 of the luma arrays hold Cb and Cr of 4:4:4 video. Chroma
/// DC of 4:2:0 video uses the first four entries of each `chroma_dc` row
/// and the first four `chroma_ac` blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Residual {
    pub luma_dc: [[i32; 16]; 3],
    pub luma_ac: [[[i32; 15]; 16]; 3],
    pub luma_4x4: [[[i32; 16]; 16]; 3],
    pub luma_8x8: [[[i32; 64]; 4]; 3],
    pub chroma_dc: [[i32; 8]; 2],
    pub chroma_ac: [[[i32; 15]; 8]; 2],
}

impl Residual {
    pub fn new() -> Self {
        Self {
            luma_dc: [[0; 16]; 3],
            luma_ac: [[[0; 15]; 16]; 3],
            luma_4x4: [[[0; 16]; 16]; 3],
            luma_8x8: [[[0; 64]; 4]; 3],
            chroma_dc: [[0; 8]; 2],
            chroma_ac: [[[0; 15]; 8]; 2],
        }
    }
}

impl Default for Residual {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a block's flags live in a macroblock record: the plane, and the
/// 4x4 entries it covers.
fn block_slot(cat: BlockCat, idx: usize) -> (usize, std::ops::Range<usize>) {
    match cat.luma_plane() {
        Some(plane) if cat.is_luma_dc() => (plane, 16..17),
        Some(plane) if cat.is_8x8() => (plane, idx * 4..idx * 4 + 4),
        Some(plane) => (plane, idx..idx + 1),
        None if cat == BlockCat::ChromaDc => (idx + 1, 16..17),
        None => ((idx >> 3) + 1, (idx & 7)..(idx & 7) + 1),
    }
}

/// `condTermFlagN` of `coded_block_flag` for one neighbor.
fn coded_block_cond(slice: &Slice, cat: BlockCat, idx: usize, pos: Neighbor) -> bool {
    let (mb, idx_n): (&Macroblock, usize) = match cat {
        _ if cat.is_luma_dc() || cat == BlockCat::ChromaDc => (slice.neighbor_mb(pos), 0),
        BlockCat::ChromaAc => {
            let (mb, blk) = slice.neighbor_block(pos, BlockSize::Chroma, idx & 7);
            (mb, (idx & !7) | blk)
        }
        _ if cat.is_8x8() => slice.neighbor_block(pos, BlockSize::Luma8x8, idx),
        _ => slice.neighbor_block(pos, BlockSize::Luma4x4, idx),
    };

    let (plane, range) = block_slot(cat, if cat == BlockCat::ChromaDc { idx } else { idx_n });
    let flag = mb.coded_block_flag[plane][range.start];

    match mb.mb_type {
        MbType::Unavailable => flag,
        MbType::IPcm => true,
        MbType::PSkip | MbType::BSkip => false,
        _ => match cat {
            _ if cat.is_luma_dc() => mb.mb_type.is_i16x16() && flag,
            BlockCat::ChromaDc => mb.cbp_chroma() != 0 && flag,
            BlockCat::ChromaAc => mb.cbp_chroma() == 2 && flag,
            _ if cat.is_8x8() => (mb.cbp_luma() >> idx_n) & 1 == 1 && mb.transform_size_8x8_flag && flag,
            _ => (mb.cbp_luma() >> (idx_n >> 2)) & 1 == 1 && flag,
        },
    }
}

/// `NumC8x8`: chroma 8x8 blocks per component.
fn num_c8x8(slice: &Slice) -> usize {
    if slice.params().chroma_array_type == 2 {
        2
    } else {
        1
    }
}

fn residual_block_cavlc(
    bs: &mut Bitstream,
    slice: &mut Slice,
    coeffs: &mut [i32],
    cat: BlockCat,
    idx: usize,
    start: usize,
    end: usize,
) -> Result<()> {
    let range = end - start + 1;

    // Levels from the highest frequency down, each with the zeros before it.
    let mut levels = [0i32; 64];
    let mut runs = [0u8; 64];
    let mut token = CoeffToken::default();
    let mut total_zeros = 0u8;

    if bs.is_encoding() {
        let mut n = 0;
        let mut prev = None;
        for i in (start..=end).rev().filter(|&i| coeffs[i] != 0) {
            levels[n] = coeffs[i];
            if let Some(prev) = prev {
                runs[n - 1] = (prev - i - 1) as u8;
            }
            prev = Some(i);
            n += 1;
        }
        if let Some(lowest) = prev {
            runs[n - 1] = (lowest - start) as u8;
        }

        token.total_coeff = n as u8;
        token.trailing_ones = levels[..n.min(3)].iter().take_while(|l| l.abs() == 1).count() as u8;
        total_zeros = runs[..n].iter().sum();
    }

    cavlc::coeff_token(bs, slice, cat, idx, &mut token)?;

    let total = usize::from(token.total_coeff);
    let trailing_ones = usize::from(token.trailing_ones);
    if total > range {
        return Err(Error::OutOfRange("more coefficients than the block holds"));
    }

    let mut suffix_length = u32::from(total > 10 && trailing_ones < 3);
    for (i, level) in levels[..total].iter_mut().enumerate() {
        if i < trailing_ones {
            let mut negative = *level < 0;
            bs.bit(&mut negative)?;
            *level = if negative { -1 } else { 1 };
            continue;
        }

        cavlc::level(bs, suffix_length, i == trailing_ones && trailing_ones < 3, level)?;

        if suffix_length == 0 {
            suffix_length = 1;
        }
        if level.unsigned_abs() > 3 << (suffix_length - 1) && suffix_length < 6 {
            suffix_length += 1;
        }
    }

    if total > 0 && total < range {
        let table = match (cat, slice.params().chroma_array_type) {
            (BlockCat::ChromaDc, 1) => TotalZerosTable::ChromaDc420,
            (BlockCat::ChromaDc, _) => TotalZerosTable::ChromaDc422,
            _ => TotalZerosTable::Block,
        };
        cavlc::total_zeros(bs, table, token.total_coeff, &mut total_zeros)?;
    }

    if total + usize::from(total_zeros) > range {
        return Err(Error::OutOfRange("total_zeros beyond the end of the block"));
    }

    let mut zeros_left = total_zeros;
    for run in runs[..total.saturating_sub(1)].iter_mut() {
        cavlc::run_before(bs, zeros_left, run)?;
        zeros_left -= *run;
    }
    if total > 0 {
        runs[total - 1] = zeros_left;
    }

    if !bs.is_encoding() {
        let mut pos = start;
        for i in (0..total).rev() {
            pos += usize::from(runs[i]);
            coeffs[pos] = levels[i];
            pos += 1;
        }
    }

    let (plane, slots) = block_slot(cat, idx);
    if !cat.is_luma_dc() && cat != BlockCat::ChromaDc {
        for slot in slots {
            slice.current_mut().total_coeff[plane][slot] = token.total_coeff;
        }
    }

    Ok(())
}

/// Increment of `significant_coeff_flag` or `last_significant_coeff_flag`
/// at scan position `i`.
fn significance_inc(slice: &Slice, cat: BlockCat, i: usize, last: bool) -> usize {
    if cat == BlockCat::ChromaDc {
        (i / num_c8x8(slice)).min(2)
    } else if cat.is_8x8() {
        usize::from(if last {
            ctxidx::LAST_8X8[i]
        } else if slice.is_field() {
            ctxidx::SIGNIFICANT_8X8_FIELD[i]
        } else {
            ctxidx::SIGNIFICANT_8X8_FRAME[i]
        })
    } else {
        i
    }
}

#[allow(clippy::too_many_arguments)]
fn residual_block_cabac(
    bs: &mut Bitstream,
    cabac: &mut Cabac,
    slice: &mut Slice,
    coeffs: &mut [i32],
    cat: BlockCat,
    idx: usize,
    start: usize,
    end: usize,
) -> Result<()> {
    let last_nonzero = (start..=end).rev().find(|&i| coeffs[i] != 0);

    let mut coded = last_nonzero.is_some();
    if coeffs.len() != 64 || slice.params().chroma_array_type == 3 {
        let ctx = ctxidx::coded_block_flag(cat)
            + usize::from(coded_block_cond(slice, cat, idx, Neighbor::A))
            + 2 * usize::from(coded_block_cond(slice, cat, idx, Neighbor::B));
        cabac.decision(bs, ctx, &mut coded)?;
    } else if bs.is_encoding() && !coded {
        return Err(Error::OutOfRange("8x8 block with no coefficients in a coded 8x8 quadrant"));
    } else {
        coded = true;
    }

    let (plane, slots) = block_slot(cat, idx);
    for slot in slots {
        slice.current_mut().coded_block_flag[plane][slot] = coded;
    }

    if !coded {
        return Ok(());
    }

    let field = slice.is_field();
    let significant = ctxidx::significance(cat, field, false);
    let last = ctxidx::significance(cat, field, true);

    let mut map = [false; 64];
    let mut num_coeff = end + 1;
    let mut i = start;
    while i + 1 < num_coeff {
        let mut sig = coeffs[i] != 0;
        cabac.decision(bs, significant + significance_inc(slice, cat, i, false), &mut sig)?;
        map[i] = sig;

        if sig {
            let mut is_last = last_nonzero == Some(i);
            cabac.decision(bs, last + significance_inc(slice, cat, i, true), &mut is_last)?;
            if is_last {
                num_coeff = i + 1;
            }
        }

        i += 1;
    }
    map[num_coeff - 1] = true;

    let abs_level = ctxidx::coeff_abs_level_minus1(cat);
    let gt1_cap = if cat == BlockCat::ChromaDc { 3 } else { 4 };
    let mut num_eq1 = 0;
    let mut num_gt1 = 0;

    for i in (start..num_coeff).rev().filter(|&i| map[i]) {
        let first = abs_level + if num_gt1 != 0 { 0 } else { (1 + num_eq1).min(4) };
        let rest = abs_level + 5 + num_gt1.min(gt1_cap);

        let mut abs_minus1 = coeffs[i].unsigned_abs().saturating_sub(1) as i32;
        binarization::ueg(bs, cabac, 0, 14, false, &[first, rest], &mut abs_minus1)?;

        let mut negative = coeffs[i] < 0;
        cabac.bypass(bs, &mut negative)?;

        if abs_minus1 == 0 {
            num_eq1 += 1;
        } else {
            num_gt1 += 1;
        }

        let abs = i64::from(abs_minus1) + 1;
        coeffs[i] = i32::try_from(if negative { -abs } else { abs })
            .map_err(|_| Error::OutOfRange("coefficient level too large"))?;
    }

    Ok(())
}

/// One block of coefficient levels, `coeffs[start..=end]`, where the length
/// of `coeffs` is the block's `maxNumCoeff`.
///
/// With CAVLC the block's `TotalCoeff` is recorded in the current
/// macroblock, and with CABAC its `coded_block_flag`. A block that is not
/// `coded` transfers no bits: it must be all zero when encoding, and reads
/// as zeros when decoding. The current macroblock's type, coded block
/// pattern and transform size must be stored before its blocks are coded.
#[allow(clippy::too_many_arguments)]
pub fn residual_block(
    bs: &mut Bitstream,
    cabac: Option<&mut Cabac>,
    slice: &mut Slice,
    coeffs: &mut [i32],
    cat: BlockCat,
    idx: usize,
    start: usize,
    end: usize,
    coded: bool,
) -> Result<()> {
    if end >= coeffs.len() || start > end {
        return Err(Error::OutOfRange("coefficient range outside of the block"));
    }

    if bs.is_encoding() {
        let outside = coeffs
            .iter()
            .enumerate()
            .any(|(i, &c)| c != 0 && (i < start || i > end || !coded));
        if outside {
            return Err(Error::OutOfRange("nonzero coefficient outside of the coded range"));
        }
    } else {
        coeffs.fill(0);
    }

    let (plane, slots) = block_slot(cat, idx);
    if !coded {
        let dc = cat.is_luma_dc() || cat == BlockCat::ChromaDc;
        let current = slice.current_mut();
        for slot in slots {
            current.coded_block_flag[plane][slot] = false;
            if !dc {
                current.total_coeff[plane][slot] = 0;
            }
        }

        return Ok(());
    }

    match cabac {
        Some(cabac) => residual_block_cabac(bs, cabac, slice, coeffs, cat, idx, start, end),
        None if cat.is_8x8() => Err(Error::ContractViolation(
            "CAVLC codes 8x8 blocks as four interleaved 4x4 blocks",
        )),
        None => residual_block_cavlc(bs, slice, coeffs, cat, idx, start, end),
    }
}

/// `residual_luma`, for one luma-like plane.
fn residual_luma(
    bs: &mut Bitstream,
    mut cabac: Option<&mut Cabac>,
    slice: &mut Slice,
    res: &mut Residual,
    plane: usize,
    start: usize,
    end: usize,
) -> Result<()> {
    let [dc, ac, blk4x4, blk8x8] = BlockCat::plane_cats(plane);
    let mb = slice.current();
    let intra16x16 = mb.mb_type.is_i16x16();
    let transform_8x8 = mb.transform_size_8x8_flag;
    let cbp_luma = mb.cbp_luma();

    let dc_coded = intra16x16 && start == 0;
    residual_block(bs, cabac.as_deref_mut(), slice, &mut res.luma_dc[plane], dc, 0, 0, 15, dc_coded)?;

    let ac_end = || end.checked_sub(1).ok_or(Error::OutOfRange("AC blocks need an end above 0"));

    for b8 in 0..4 {
        let coded = (cbp_luma >> b8) & 1 == 1;

        if transform_8x8 && cabac.is_some() {
            let coeffs = &mut res.luma_8x8[plane][b8];
            residual_block(bs, cabac.as_deref_mut(), slice, coeffs, blk8x8, b8, 4 * start, 4 * end + 3, coded)?;
            continue;
        }

        for b4 in 0..4 {
            let blk = b8 * 4 + b4;

            if intra16x16 {
                let coeffs = &mut res.luma_ac[plane][blk];
                let start = start.saturating_sub(1);
                residual_block(bs, cabac.as_deref_mut(), slice, coeffs, ac, blk, start, ac_end()?, coded)?;
            } else if transform_8x8 {
                let mut coeffs = [0; 16];
                for (j, c) in coeffs.iter_mut().enumerate() {
                    *c = res.luma_8x8[plane][b8][4 * j + b4];
                }

                residual_block(bs, None, slice, &mut coeffs, blk4x4, blk, start, end, coded)?;

                for (j, c) in coeffs.iter().enumerate() {
                    res.luma_8x8[plane][b8][4 * j + b4] = *c;
                }
            } else {
                let coeffs = &mut res.luma_4x4[plane][blk];
                residual_block(bs, cabac.as_deref_mut(), slice, coeffs, blk4x4, blk, start, end, coded)?;
            }
        }
    }

    Ok(())
}

/// `residual`: every coefficient block of the current macroblock, as its
/// type, coded block pattern and transform size call for.
///
/// When decoding, `res` is cleared first. Arrays the macroblock does not
/// code are ignored when encoding.
pub fn residual(
    bs: &mut Bitstream,
    mut cabac: Option<&mut Cabac>,
    slice: &mut Slice,
    res: &mut Residual,
    start: usize,
    end: usize,
) -> Result<()> {
    if start > end || end > 15 {
        return Err(Error::OutOfRange("coefficient range outside of the block"));
    }

    if !bs.is_encoding() {
        *res = Residual::new();
    }

    residual_luma(bs, cabac.as_deref_mut(), slice, res, 0, start, end)?;

    match slice.params().chroma_array_type {
        1 | 2 => {
            let blocks = 4 * num_c8x8(slice);
            let cbp_chroma = slice.current().cbp_chroma();

            for c in 0..2 {
                let coeffs = &mut res.chroma_dc[c][..blocks];
                let coded = cbp_chroma != 0 && start == 0;
                residual_block(bs, cabac.as_deref_mut(), slice, coeffs, BlockCat::ChromaDc, c, 0, blocks - 1, coded)?;
            }

            for c in 0..2 {
                for b in 0..blocks {
                    let coeffs = &mut res.chroma_ac[c][b];
                    let coded = cbp_chroma & 2 != 0;
                    let ac_end = end
                        .checked_sub(1)
                        .ok_or(Error::OutOfRange("AC blocks need an end above 0"))?;

                    residual_block(
                        bs,
                        cabac.as_deref_mut(),
                        slice,
                        coeffs,
                        BlockCat::ChromaAc,
                        c * 8 + b,
                        start.saturating_sub(1),
                        ac_end,
                        coded,
                    )?;
                }
            }
        }
        3 => {
            residual_luma(bs, cabac.as_deref_mut(), slice, res, 1, start, end)?;
            residual_luma(bs, cabac.as_deref_mut(), slice, res, 2, start, end)?;
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::bitstream::{AlignMode, Bitstream, StreamFormat};
    use crate::cabac::{Cabac, ContextBank, H264_TABLES};
    use crate::error::Error;
    use crate::h264::macroblock::{Macroblock, MacroblockGrid};
    use crate::h264::residual::{self, Residual};
    use crate::h264::slice::{Slice, SliceFlags, SliceParams};
    use crate::h264::types::{BlockCat, MbType, SliceType};

    struct Lcg(u32);

    impl Lcg {
        fn next(&mut self, n: u32) -> u32 {
            self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (self.0 >> 16) % n
        }

        /// A sparse block: mostly zeros, a few small levels and the odd
        /// large one.
        fn fill(&mut self, coeffs: &mut [i32]) {
            let density = 1 + self.next(4);
            for c in coeffs.iter_mut() {
                let roll = self.next(16);
                *c = if roll < density {
                    1 - 2 * self.next(2) as i32
                } else if roll < 2 * density {
                    self.next(9) as i32 - 4
                } else if roll == 15 && self.next(4) == 0 {
                    self.next(5000) as i32 - 2500
                } else {
                    0
                };
            }
        }
    }

    fn coder() -> Cabac {
        Cabac::new(&H264_TABLES, ContextBank::new(ContextBank::H264_LEN))
    }

    /// A random macroblock record ready for its residual, and the levels it
    /// codes.
    fn random_mb(rng: &mut Lcg, chroma_array_type: u8, cabac: bool) -> (Macroblock, Residual) {
        let mb_type = match rng.next(3) {
            0 => MbType::I16x16 {
                pred_mode: 0,
                cbp_chroma: rng.next(3) as u8,
                cbp_luma_all: rng.next(2) == 1,
            },
            1 => MbType::INxN,
            _ => MbType::P16x16,
        };

        let mut mb = Macroblock::new(mb_type);
        if !mb_type.is_i16x16() {
            let chroma = if matches!(chroma_array_type, 1 | 2) { rng.next(3) } else { 0 };
            mb.coded_block_pattern = rng.next(16) | chroma << 4;
            mb.transform_size_8x8_flag = rng.next(2) == 1;
        }

        let mut res = Residual::new();
        let planes = if chroma_array_type == 3 { 3 } else { 1 };
        for plane in 0..planes {
            if mb_type.is_i16x16() {
                rng.fill(&mut res.luma_dc[plane]);
            }

            for b8 in 0..4 {
                if (mb.cbp_luma() >> b8) & 1 == 0 {
                    continue;
                }

                for b4 in 0..4 {
                    if mb_type.is_i16x16() {
                        rng.fill(&mut res.luma_ac[plane][b8 * 4 + b4]);
                    } else if !mb.transform_size_8x8_flag {
                        rng.fill(&mut res.luma_4x4[plane][b8 * 4 + b4]);
                    }
                }

                if mb.transform_size_8x8_flag {
                    rng.fill(&mut res.luma_8x8[plane][b8]);
                    if cabac && chroma_array_type != 3 {
                        // The coded block flag of these blocks is implied.
                        res.luma_8x8[plane][b8][0] = 5;
                    }
                }
            }
        }

        if matches!(chroma_array_type, 1 | 2) {
            let blocks = 4 * usize::from(chroma_array_type);
            for c in 0..2 {
                if mb.cbp_chroma() != 0 {
                    rng.fill(&mut res.chroma_dc[c][..blocks]);
                }
                if mb.cbp_chroma() == 2 {
                    for b in 0..blocks {
                        rng.fill(&mut res.chroma_ac[c][b]);
                    }
                }
            }
        }

        (mb, res)
    }

    fn round_trip(chroma_array_type: u8, use_cabac: bool, field: bool, seed: u32) {
        let mut params = SliceParams::new(SliceType::P);
        params.chroma_array_type = chroma_array_type;
        if field {
            params.flags = SliceFlags::FieldPic;
        }

        let mut rng = Lcg(seed);
        let mbs: Vec<(Macroblock, Residual)> = (0..6)
            .map(|_| random_mb(&mut rng, chroma_array_type, use_cabac))
            .collect();

        let mut grid = MacroblockGrid::new(3, 2);
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        let mut cabac = coder();
        if use_cabac {
            cabac.init(&mut bs).unwrap();
        }
        let mut slice = Slice::new(&mut grid, params).unwrap();
        for (i, (mb, res)) in mbs.iter().enumerate() {
            if i > 0 {
                slice.advance().unwrap();
            }
            *slice.current_mut() = mb.clone();
            residual::residual(&mut bs, use_cabac.then_some(&mut cabac), &mut slice, &mut res.clone(), 0, 15)
                .unwrap();
        }
        if use_cabac {
            cabac.terminate(&mut bs, &mut true).unwrap();
        } else {
            bs.mark(1u8, 1).unwrap();
        }
        bs.align_byte(AlignMode::Zero).unwrap();

        let mut decoded = MacroblockGrid::new(3, 2);
        let mut dec = Bitstream::new_decoder(StreamFormat::H264, bs.into_bytes());
        let mut cabac = coder();
        if use_cabac {
            cabac.init(&mut dec).unwrap();
        }
        let mut slice = Slice::new(&mut decoded, params).unwrap();
        for (i, (mb, expected)) in mbs.iter().enumerate() {
            if i > 0 {
                slice.advance().unwrap();
            }
            *slice.current_mut() = mb.clone();

            let mut res = Residual::new();
            res.luma_dc[0][3] = 99;
            residual::residual(&mut dec, use_cabac.then_some(&mut cabac), &mut slice, &mut res, 0, 15).unwrap();
            assert_eq!(expected, &res);
        }

        assert_eq!(grid.iter().collect::<Vec<_>>(), decoded.iter().collect::<Vec<_>>());
    }

    #[test]
    fn cavlc_macroblocks() {
        for seed in 0..6 {
            round_trip(1, false, false, seed);
            round_trip(2, false, false, seed);
            round_trip(3, false, false, seed);
            round_trip(0, false, false, seed);
        }
    }

    #[test]
    fn cabac_macroblocks() {
        for seed in 0..6 {
            round_trip(1, true, seed % 2 == 1, seed);
            round_trip(2, true, false, seed);
            round_trip(3, true, seed % 2 == 0, seed);
            round_trip(0, true, false, seed);
        }
    }

    #[test]
    fn cavlc_records_total_coeff() {
        let mut grid = MacroblockGrid::new(1, 1);
        grid[0].mb_type = MbType::INxN;
        grid[0].coded_block_pattern = 0x1;
        let mut slice = Slice::new(&mut grid, SliceParams::new(SliceType::I)).unwrap();

        let mut coeffs = [0, 3, 0, -1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        residual::residual_block(&mut bs, None, &mut slice, &mut coeffs, BlockCat::Luma4x4, 2, 0, 15, true).unwrap();
        assert_eq!(3, slice.current().total_coeff[0][2]);

        residual::residual_block(&mut bs, None, &mut slice, &mut [0; 16], BlockCat::Luma4x4, 5, 0, 15, false)
            .unwrap();
        assert_eq!(0, slice.current().total_coeff[0][5]);
    }

    #[test]
    fn block_range_checks() {
        let mut grid = MacroblockGrid::new(1, 1);
        let mut slice = Slice::new(&mut grid, SliceParams::new(SliceType::I)).unwrap();
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);

        assert_eq!(
            Error::OutOfRange("coefficient range outside of the block"),
            residual::residual_block(&mut bs, None, &mut slice, &mut [0; 16], BlockCat::Luma4x4, 0, 0, 16, true)
                .unwrap_err()
        );

        let mut coeffs = [0; 16];
        coeffs[12] = 4;
        assert_eq!(
            Error::OutOfRange("nonzero coefficient outside of the coded range"),
            residual::residual_block(&mut bs, None, &mut slice, &mut coeffs, BlockCat::Luma4x4, 0, 0, 7, true)
                .unwrap_err()
        );
        assert_eq!(
            Error::OutOfRange("nonzero coefficient outside of the coded range"),
            residual::residual_block(&mut bs, None, &mut slice, &mut coeffs, BlockCat::Luma4x4, 0, 0, 15, false)
                .unwrap_err()
        );
        assert_eq!(
            Error::ContractViolation("CAVLC codes 8x8 blocks as four interleaved 4x4 blocks"),
            residual::residual_block(&mut bs, None, &mut slice, &mut [0; 64], BlockCat::Luma8x8, 0, 0, 63, true)
                .unwrap_err()
        );
    }

    #[test]
    fn partial_coefficient_range() {
        let mut params = SliceParams::new(SliceType::I);
        params.chroma_array_type = 0;

        let mut mb = Macroblock::new(MbType::INxN);
        mb.coded_block_pattern = 0xf;
        let mut res = Residual::new();
        for (blk, coeffs) in res.luma_4x4[0].iter_mut().enumerate() {
            coeffs[3] = blk as i32 - 8;
            coeffs[5] = 1;
        }

        let mut grid = MacroblockGrid::new(1, 1);
        let mut slice = Slice::new(&mut grid, params).unwrap();
        *slice.current_mut() = mb.clone();
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        residual::residual(&mut bs, None, &mut slice, &mut res.clone(), 3, 6).unwrap();
        bs.mark(1u8, 1).unwrap();
        bs.align_byte(AlignMode::Zero).unwrap();

        let mut grid = MacroblockGrid::new(1, 1);
        let mut slice = Slice::new(&mut grid, params).unwrap();
        *slice.current_mut() = mb;
        let mut dec = Bitstream::new_decoder(StreamFormat::H264, bs.into_bytes());
        let mut out = Residual::new();
        residual::residual(&mut dec, None, &mut slice, &mut out, 3, 6).unwrap();
        assert_eq!(res, out);
    }
}
