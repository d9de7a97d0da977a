//! CAVLC residual elements (9.2)

mod tables;

use crate::bitstream::{Bitstream, VlcTable};
use crate::error::{Error, Result};
use crate::h264::slice::{BlockNeighbor, BlockSize, Neighbor, Slice};
use crate::h264::types::{BlockCat, MbType};

/// `coeff_token`: how many coefficients a block has, and how many of the
/// last ones are trailing ±1s.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct CoeffToken {
    pub trailing_ones: u8,
    pub total_coeff: u8,
}

/// The code tables of `total_zeros`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TotalZerosTable {
    /// Tables 9-7 and 9-8, for blocks of up to 16 coefficients.
    Block,

    /// Table 9-9 (a), chroma DC of 4:2:0 video.
    ChromaDc420,

    /// Table 9-9 (b), chroma DC of 4:2:2 video.
    ChromaDc422,
}

lazy_static! {
    static ref COEFF_TOKEN: [VlcTable<CoeffToken>; 4] = [
        VlcTable::new(&tables::COEFF_TOKEN_0),
        VlcTable::new(&tables::COEFF_TOKEN_2),
        VlcTable::new(&tables::COEFF_TOKEN_4),
        VlcTable::new(&tables::COEFF_TOKEN_8),
    ];
    static ref COEFF_TOKEN_CHROMA_DC_420: VlcTable<CoeffToken> = VlcTable::new(&tables::COEFF_TOKEN_NEG1);
    static ref COEFF_TOKEN_CHROMA_DC_422: VlcTable<CoeffToken> = VlcTable::new(&tables::COEFF_TOKEN_NEG2);
    static ref TOTAL_ZEROS: [VlcTable<u8>; 15] = [
        VlcTable::new(&tables::TOTAL_ZEROS_1),
        VlcTable::new(&tables::TOTAL_ZEROS_2),
        VlcTable::new(&tables::TOTAL_ZEROS_3),
        VlcTable::new(&tables::TOTAL_ZEROS_4),
        VlcTable::new(&tables::TOTAL_ZEROS_5),
        VlcTable::new(&tables::TOTAL_ZEROS_6),
        VlcTable::new(&tables::TOTAL_ZEROS_7),
        VlcTable::new(&tables::TOTAL_ZEROS_8),
        VlcTable::new(&tables::TOTAL_ZEROS_9),
        VlcTable::new(&tables::TOTAL_ZEROS_10),
        VlcTable::new(&tables::TOTAL_ZEROS_11),
        VlcTable::new(&tables::TOTAL_ZEROS_12),
        VlcTable::new(&tables::TOTAL_ZEROS_13),
        VlcTable::new(&tables::TOTAL_ZEROS_14),
        VlcTable::new(&tables::TOTAL_ZEROS_15),
    ];
    static ref TOTAL_ZEROS_CHROMA_DC_420: [VlcTable<u8>; 3] = [
        VlcTable::new(&tables::TOTAL_ZEROS_CHROMA_DC_420_1),
        VlcTable::new(&tables::TOTAL_ZEROS_CHROMA_DC_420_2),
        VlcTable::new(&tables::TOTAL_ZEROS_CHROMA_DC_420_3),
    ];
    static ref TOTAL_ZEROS_CHROMA_DC_422: [VlcTable<u8>; 7] = [
        VlcTable::new(&tables::TOTAL_ZEROS_CHROMA_DC_422_1),
        VlcTable::new(&tables::TOTAL_ZEROS_CHROMA_DC_422_2),
        VlcTable::new(&tables::TOTAL_ZEROS_CHROMA_DC_422_3),
        VlcTable::new(&tables::TOTAL_ZEROS_CHROMA_DC_422_4),
        VlcTable::new(&tables::TOTAL_ZEROS_CHROMA_DC_422_5),
        VlcTable::new(&tables::TOTAL_ZEROS_CHROMA_DC_422_6),
        VlcTable::new(&tables::TOTAL_ZEROS_CHROMA_DC_422_7),
    ];
    static ref RUN_BEFORE: [VlcTable<u8>; 7] = [
        VlcTable::new(&tables::RUN_BEFORE_1),
        VlcTable::new(&tables::RUN_BEFORE_2),
        VlcTable::new(&tables::RUN_BEFORE_3),
        VlcTable::new(&tables::RUN_BEFORE_4),
        VlcTable::new(&tables::RUN_BEFORE_5),
        VlcTable::new(&tables::RUN_BEFORE_6),
        VlcTable::new(&tables::RUN_BEFORE_X),
    ];
}

/// `nN` of one neighboring block, or `None` if it is not available.
fn neighbor_total(neighbor: BlockNeighbor, plane: usize) -> Option<u32> {
    let mb = neighbor.mb;
    match mb.mb_type {
        // An inter neighbor hidden from an intra macroblock still counts,
        // with no coefficients.
        _ if neighbor.filtered => Some(0),
        MbType::Unavailable => None,
        MbType::PSkip | MbType::BSkip => Some(0),
        MbType::IPcm => Some(16),
        _ => Some(u32::from(mb.total_coeff[plane][neighbor.idx])),
    }
}

/// `coeff_token` of block `idx` in category `cat`.
///
/// Chroma AC blocks are numbered 0 to 7 for Cb and 8 to 15 for Cr. DC
/// categories take `idx` 0, except chroma DC which takes the chroma
/// component, 0 or 1.
pub fn coeff_token(bs: &mut Bitstream, slice: &Slice, cat: BlockCat, idx: usize, val: &mut CoeffToken) -> Result<()> {
    let table: &VlcTable<CoeffToken> = if cat == BlockCat::ChromaDc {
        match slice.params().chroma_array_type {
            1 => &*COEFF_TOKEN_CHROMA_DC_420,
            2 => &*COEFF_TOKEN_CHROMA_DC_422,
            _ => return Err(Error::ContractViolation("chroma DC blocks need 4:2:0 or 4:2:2 video")),
        }
    } else {
        let (size, plane, blk) = match cat.luma_plane() {
            Some(plane) if cat.is_luma_dc() => (BlockSize::Luma4x4, plane, 0),
            Some(plane) => (BlockSize::Luma4x4, plane, idx),
            None => (BlockSize::Chroma, (idx >> 3) + 1, idx & 7),
        };

        let total = |pos: Neighbor| neighbor_total(slice.locate_block(pos, size, blk), plane);

        let n_c = match (total(Neighbor::A), total(Neighbor::B)) {
            (Some(a), Some(b)) => (a + b + 1) >> 1,
            (Some(n), None) | (None, Some(n)) => n,
            (None, None) => 0,
        };

        match n_c {
            0..=1 => &COEFF_TOKEN[0],
            2..=3 => &COEFF_TOKEN[1],
            4..=7 => &COEFF_TOKEN[2],
            _ => &COEFF_TOKEN[3],
        }
    };

    bs.vlc(val, table)
}

/// One coefficient level, as `level_prefix` and `level_suffix`.
///
/// `one_bias` is set for the first level after fewer than three trailing
/// ones, which cannot be ±1. The caller updates `suffix_length` between
/// levels.
pub fn level(bs: &mut Bitstream, suffix_length: u32, one_bias: bool, val: &mut i32) -> Result<()> {
    if suffix_length > 6 {
        return Err(Error::OutOfRange("suffixLength above 6"));
    }

    let bias = if one_bias { 2 } else { 0 };
    let escape = (15i64 << suffix_length) + if suffix_length == 0 { 15 } else { 0 };

    let mut prefix = 0u32;
    let mut suffix = 0i64;
    let mut suffix_size = suffix_length;

    if bs.is_encoding() {
        let level = i64::from(*val);
        let code = (if level > 0 { 2 * level - 2 } else { -2 * level - 1 }) - bias;
        if level == 0 || code < 0 {
            return Err(Error::OutOfRange("level cannot be coded here"));
        }

        if suffix_length == 0 && code < 14 {
            prefix = code as u32;
            suffix_size = 0;
        } else if suffix_length == 0 && code < 30 {
            prefix = 14;
            suffix = code - 14;
            suffix_size = 4;
        } else if code < 15 << suffix_length {
            prefix = (code >> suffix_length) as u32;
            suffix = code & ((1 << suffix_length) - 1);
        } else if code - escape < 4096 {
            prefix = 15;
            suffix = code - escape;
            suffix_size = 12;
        } else {
            let rest = code - escape + 4096;
            suffix_size = 63 - rest.leading_zeros();
            prefix = suffix_size + 3;
            suffix = rest - (1 << suffix_size);
        }
    }

    if bs.is_encoding() {
        if prefix > 31 {
            return Err(Error::OutOfRange("level too large"));
        }

        for _ in 0..prefix {
            bs.bit(&mut false)?;
        }
        bs.bit(&mut true)?;
    } else {
        loop {
            let mut bit = false;
            bs.bit(&mut bit)?;
            if bit {
                break;
            }

            prefix += 1;
            if prefix > 31 {
                return Err(Error::OutOfRange("level_prefix too long"));
            }
        }

        suffix_size = match prefix {
            14 if suffix_length == 0 => 4,
            0..=14 => suffix_length,
            _ => prefix - 3,
        };
    }

    if suffix_size > 0 {
        let mut bits = suffix as u32;
        bs.u(&mut bits, suffix_size)?;
        suffix = i64::from(bits);
    }

    let mut code = (i64::from(prefix.min(15)) << suffix_length) + suffix;
    if prefix >= 15 && suffix_length == 0 {
        code += 15;
    }
    if prefix >= 16 {
        code += (1 << (prefix - 3)) - 4096;
    }
    code += bias;

    let level = if code % 2 == 0 {
        (code + 2) >> 1
    } else {
        (-code - 1) >> 1
    };
    *val = i32::try_from(level).map_err(|_| Error::OutOfRange("level too large"))?;

    Ok(())
}

/// `total_zeros` of a block with `total_coeff` coefficients.
pub fn total_zeros(bs: &mut Bitstream, table: TotalZerosTable, total_coeff: u8, val: &mut u8) -> Result<()> {
    let tables: &[VlcTable<u8>] = match table {
        TotalZerosTable::Block => &TOTAL_ZEROS[..],
        TotalZerosTable::ChromaDc420 => &TOTAL_ZEROS_CHROMA_DC_420[..],
        TotalZerosTable::ChromaDc422 => &TOTAL_ZEROS_CHROMA_DC_422[..],
    };

    let table = usize::from(total_coeff)
        .checked_sub(1)
        .and_then(|i| tables.get(i))
        .ok_or(Error::OutOfRange("no total_zeros table for this coefficient count"))?;

    bs.vlc(val, table)
}

/// `run_before`, with `zeros_left` zeros still to place.
pub fn run_before(bs: &mut Bitstream, zeros_left: u8, val: &mut u8) -> Result<()> {
    if bs.is_encoding() && *val > zeros_left {
        return Err(Error::OutOfRange("run_before above zerosLeft"));
    }

    match zeros_left {
        0 => bs.infer(val, 0)?,
        1..=6 => bs.vlc(val, &RUN_BEFORE[usize::from(zeros_left) - 1])?,
        _ => bs.vlc(val, &RUN_BEFORE[6])?,
    }

    if *val > zeros_left {
        return Err(Error::OutOfRange("run_before above zerosLeft"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::bitstream::{AlignMode, Bitstream, StreamFormat, VlcTable};
    use crate::error::Error;
    use crate::h264::cavlc::{self, CoeffToken, TotalZerosTable};
    use crate::h264::macroblock::MacroblockGrid;
    use crate::h264::slice::{Slice, SliceFlags, SliceParams};
    use crate::h264::types::{BlockCat, MbType, SliceType};

    /// Encode every codeword of a table, then decode them all back.
    fn check_table<T: PartialEq + Copy + std::fmt::Debug + Default>(table: &VlcTable<T>) {
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        for code in table.codes() {
            bs.vlc(&mut code.value.clone(), table).unwrap();
        }
        bs.mark(1u8, 1).unwrap();
        bs.align_byte(AlignMode::Zero).unwrap();

        let mut dec = Bitstream::new_decoder(StreamFormat::H264, bs.into_bytes());
        for code in table.codes() {
            let mut value = T::default();
            dec.vlc(&mut value, table).unwrap();
            assert_eq!(code.value, value);
        }
    }

    #[test]
    fn every_table_round_trips() {
        for table in cavlc::COEFF_TOKEN.iter() {
            check_table(table);
        }
        check_table(&cavlc::COEFF_TOKEN_CHROMA_DC_420);
        check_table(&cavlc::COEFF_TOKEN_CHROMA_DC_422);

        for table in cavlc::TOTAL_ZEROS
            .iter()
            .chain(cavlc::TOTAL_ZEROS_CHROMA_DC_420.iter())
            .chain(cavlc::TOTAL_ZEROS_CHROMA_DC_422.iter())
            .chain(cavlc::RUN_BEFORE.iter())
        {
            check_table(table);
        }
    }

    #[test]
    fn table_sizes() {
        let sizes: Vec<usize> = cavlc::TOTAL_ZEROS.iter().map(|t| t.codes().len()).collect();
        assert_eq!((2..=16).rev().collect::<Vec<_>>(), sizes);
        assert_eq!(62, cavlc::COEFF_TOKEN[3].codes().len());
        assert_eq!(15, cavlc::RUN_BEFORE[6].codes().len());
    }

    #[test]
    fn levels_round_trip() {
        let cases: &[(u32, bool, i32)] = &[
            (0, false, 1),
            (0, false, -1),
            (0, false, 7),
            (0, false, -8),
            (0, false, 15),
            (0, false, 16),
            (0, false, -100),
            (0, false, 3000),
            (0, true, 2),
            (0, true, -2),
            (0, true, 9),
            (1, false, 1),
            (1, false, -15),
            (1, false, 16),
            (2, false, 29),
            (3, false, -60),
            (4, false, 120),
            (6, false, 480),
            (6, false, -481),
            (6, false, 3000),
            (1, false, 100_000),
            (0, true, -1_000_000),
        ];

        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        for &(suffix_length, one_bias, level) in cases {
            cavlc::level(&mut bs, suffix_length, one_bias, &mut level.clone()).unwrap();
        }
        bs.mark(1u8, 1).unwrap();
        bs.align_byte(AlignMode::Zero).unwrap();

        let mut dec = Bitstream::new_decoder(StreamFormat::H264, bs.into_bytes());
        for &(suffix_length, one_bias, level) in cases {
            let mut out = 0;
            cavlc::level(&mut dec, suffix_length, one_bias, &mut out).unwrap();
            assert_eq!(level, out);
        }
    }

    #[test]
    fn level_codewords() {
        // Level 1 at suffixLength 0 is levelCode 0, a lone one bit. Level -2
        // at suffixLength 1 is levelCode 3: prefix 1, suffix 1.
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        cavlc::level(&mut bs, 0, false, &mut 1).unwrap();
        cavlc::level(&mut bs, 1, false, &mut -2).unwrap();
        bs.align_byte(AlignMode::Zero).unwrap();
        assert_eq!(vec![0b1011_0000], bs.into_bytes());

        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        assert_eq!(
            Error::OutOfRange("level cannot be coded here"),
            cavlc::level(&mut bs, 0, true, &mut 1).unwrap_err()
        );
        assert_eq!(
            Error::OutOfRange("level cannot be coded here"),
            cavlc::level(&mut bs, 2, false, &mut 0).unwrap_err()
        );
    }

    #[test]
    fn total_zeros_and_runs() {
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        cavlc::total_zeros(&mut bs, TotalZerosTable::Block, 1, &mut 15).unwrap();
        cavlc::total_zeros(&mut bs, TotalZerosTable::ChromaDc420, 3, &mut 1).unwrap();
        cavlc::total_zeros(&mut bs, TotalZerosTable::ChromaDc422, 7, &mut 1).unwrap();
        cavlc::run_before(&mut bs, 0, &mut 0).unwrap();
        cavlc::run_before(&mut bs, 3, &mut 3).unwrap();
        cavlc::run_before(&mut bs, 14, &mut 14).unwrap();
        assert_eq!(
            Error::OutOfRange("run_before above zerosLeft"),
            cavlc::run_before(&mut bs, 2, &mut 3).unwrap_err()
        );
        assert_eq!(
            Error::OutOfRange("no total_zeros table for this coefficient count"),
            cavlc::total_zeros(&mut bs, TotalZerosTable::ChromaDc420, 4, &mut 0).unwrap_err()
        );
        bs.mark(1u8, 1).unwrap();
        bs.align_byte(AlignMode::Zero).unwrap();

        let mut dec = Bitstream::new_decoder(StreamFormat::H264, bs.into_bytes());
        let mut zeros = 0;
        cavlc::total_zeros(&mut dec, TotalZerosTable::Block, 1, &mut zeros).unwrap();
        assert_eq!(15, zeros);
        cavlc::total_zeros(&mut dec, TotalZerosTable::ChromaDc420, 3, &mut zeros).unwrap();
        assert_eq!(1, zeros);
        cavlc::total_zeros(&mut dec, TotalZerosTable::ChromaDc422, 7, &mut zeros).unwrap();
        assert_eq!(1, zeros);

        let mut run = 9;
        cavlc::run_before(&mut dec, 0, &mut run).unwrap();
        assert_eq!(0, run);
        cavlc::run_before(&mut dec, 3, &mut run).unwrap();
        assert_eq!(3, run);
        cavlc::run_before(&mut dec, 14, &mut run).unwrap();
        assert_eq!(14, run);
    }

    #[test]
    fn coeff_token_picks_table_from_neighbors() {
        let mut grid = MacroblockGrid::new(2, 2);
        grid[0].mb_type = MbType::P16x16;
        grid[0].total_coeff[0][10] = 3;
        grid[1].mb_type = MbType::P16x16;
        grid[1].total_coeff[0][10] = 9;
        grid[2].mb_type = MbType::IPcm;
        grid[3].mb_type = MbType::P16x16;

        let mut slice = Slice::new(&mut grid, SliceParams::new(SliceType::P)).unwrap();
        slice.advance().unwrap();
        slice.advance().unwrap();
        slice.advance().unwrap();

        // Block 0 of macroblock 3: A is block 5 of the I_PCM macroblock (16)
        // and B is block 10 of macroblock 1 (9), so nC is 13.
        let token = CoeffToken {
            trailing_ones: 0,
            total_coeff: 0,
        };
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        cavlc::coeff_token(&mut bs, &slice, BlockCat::Luma4x4, 0, &mut token.clone()).unwrap();
        bs.align_byte(AlignMode::Zero).unwrap();

        // Table 9-5, 8 <= nC: 0 0 is 0000 11.
        assert_eq!(vec![0b0000_1100], bs.into_bytes());
    }

    #[test]
    fn hidden_inter_neighbors_count_as_empty() {
        let mut grid = MacroblockGrid::new(2, 2);
        grid[1].mb_type = MbType::INxN;
        grid[1].total_coeff[0][10] = 6;
        grid[2].mb_type = MbType::P16x16;
        grid[2].total_coeff[0][5] = 12;
        grid[3].mb_type = MbType::INxN;

        let mut params = SliceParams::new(SliceType::P);
        params.flags = SliceFlags::ConstrainedIntraPred | SliceFlags::DataPartitioned;
        let mut slice = Slice::new(&mut grid, params).unwrap();
        slice.advance().unwrap();
        slice.advance().unwrap();
        slice.advance().unwrap();

        // A is hidden and counts as 0, B has 6, so nC is 3 rather than 6.
        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        cavlc::coeff_token(&mut bs, &slice, BlockCat::Luma4x4, 0, &mut CoeffToken::default()).unwrap();
        bs.align_byte(AlignMode::Zero).unwrap();

        // Table 9-5, 2 <= nC < 4: 0 0 is 11.
        assert_eq!(vec![0b1100_0000], bs.into_bytes());
    }

    #[test]
    fn chroma_dc_needs_chroma() {
        let mut grid = MacroblockGrid::new(1, 1);
        let mut params = SliceParams::new(SliceType::I);
        params.chroma_array_type = 3;
        let slice = Slice::new(&mut grid, params).unwrap();

        let mut bs = Bitstream::new_encoder(StreamFormat::H264);
        assert_eq!(
            Error::ContractViolation("chroma DC blocks need 4:2:0 or 4:2:2 video"),
            cavlc::coeff_token(&mut bs, &slice, BlockCat::ChromaDc, 0, &mut CoeffToken::default()).unwrap_err()
        );
    }
}
