//! Per-macroblock coding state

use crate::error::{Error, Result};
use crate::h264::types::{MbType, SubMbType};
use std::ops::{Index, IndexMut};

/// The coded state of one macroblock that the contexts of its neighbors
/// depend on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Macroblock {
    pub mb_type: MbType,

    pub mb_field_decoding_flag: bool,

    pub transform_size_8x8_flag: bool,

    /// Luma pattern in the low four bits, chroma pattern (0, 1 or 2) above.
    ///
    /// Callers store 0x2f for `I_PCM` macroblocks and 0 for skipped ones.
    pub coded_block_pattern: u32,

    pub mb_qp_delta: i32,

    pub intra_chroma_pred_mode: u32,

    pub sub_mb_type: [Option<SubMbType>; 4],

    /// Reference index per list and 8x8 partition. `None` marks a list the
    /// partition does not predict from.
    pub ref_idx: [[Option<u32>; 4]; 2],

    /// Motion vector differences per list and 4x4 block, horizontal first.
    pub mvd: [[[i32; 2]; 16]; 2],

    /// `TotalCoeff(coeff_token)` per plane and 4x4 block. Chroma planes of
    /// 4:2:0 and 4:2:2 video use blocks 0 to 7 of planes 1 and 2.
    pub total_coeff: [[u8; 16]; 3],

    /// `coded_block_flag` per plane and 4x4 block. Entry 16 of each plane is
    /// the DC block.
    pub coded_block_flag: [[bool; 17]; 3],
}

impl Macroblock {
    const fn unavailable(coded: bool) -> Self {
        Self {
            mb_type: MbType::Unavailable,
            mb_field_decoding_flag: false,
            transform_size_8x8_flag: false,
            coded_block_pattern: 0x0f,
            mb_qp_delta: 0,
            intra_chroma_pred_mode: 0,
            sub_mb_type: [None; 4],
            ref_idx: [[None; 4]; 2],
            mvd: [[[0; 2]; 16]; 2],
            total_coeff: [[0; 16]; 3],
            coded_block_flag: [[coded; 17]; 3],
        }
    }

    /// A fresh record of the given type, with nothing coded.
    pub fn new(mb_type: MbType) -> Self {
        Self {
            mb_type,
            coded_block_pattern: 0,
            ..Self::unavailable(false)
        }
    }

    /// The luma half of the coded block pattern, implied by the type for
    /// Intra 16x16 macroblocks.
    pub fn cbp_luma(&self) -> u32 {
        match self.mb_type {
            MbType::I16x16 { cbp_luma_all, .. } => 15 * u32::from(cbp_luma_all),
            _ => self.coded_block_pattern & 0xf,
        }
    }

    /// `CodedBlockPatternChroma`, implied by the type for Intra 16x16
    /// macroblocks.
    pub fn cbp_chroma(&self) -> u32 {
        match self.mb_type {
            MbType::I16x16 { cbp_chroma, .. } => u32::from(cbp_chroma),
            _ => self.coded_block_pattern >> 4,
        }
    }
}

impl Default for Macroblock {
    fn default() -> Self {
        Self::new(MbType::Unavailable)
    }
}

/// What an unavailable neighbor looks like to an intra macroblock.
pub static UNAVAILABLE_INTRA: Macroblock = Macroblock::unavailable(true);

/// What an unavailable neighbor looks like to an inter macroblock, and what
/// an inter neighbor looks like under constrained intra prediction.
pub static UNAVAILABLE_INTER: Macroblock = Macroblock::unavailable(false);

/// All macroblocks of a picture, in raster order.
///
/// Under MBAFF the two macroblocks of a pair sit at consecutive addresses,
/// top first, and `width` still counts macroblocks per row.
#[derive(Clone, Debug)]
pub struct MacroblockGrid {
    width: usize,
    height: usize,
    mbs: Vec<Macroblock>,
    slice_groups: Option<Vec<u32>>,
}

impl MacroblockGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            mbs: vec![Macroblock::default(); width * height],
            slice_groups: None,
        }
    }

    /// Attach a map from macroblock address to slice group.
    pub fn with_slice_groups(mut self, map: Vec<u32>) -> Result<Self> {
        if map.len() != self.mbs.len() {
            return Err(Error::OutOfRange("slice group map does not cover the grid"));
        }

        self.slice_groups = Some(map);
        Ok(self)
    }

    /// Width in macroblocks.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in macroblocks.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.mbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mbs.is_empty()
    }

    pub fn get(&self, addr: usize) -> Option<&Macroblock> {
        self.mbs.get(addr)
    }

    pub fn get_mut(&mut self, addr: usize) -> Option<&mut Macroblock> {
        self.mbs.get_mut(addr)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Macroblock> {
        self.mbs.iter()
    }

    pub fn slice_group(&self, addr: usize) -> u32 {
        self.slice_groups
            .as_ref()
            .and_then(|map| map.get(addr).copied())
            .unwrap_or(0)
    }
}

impl Index<usize> for MacroblockGrid {
    type Output = Macroblock;

    fn index(&self, addr: usize) -> &Macroblock {
        &self.mbs[addr]
    }
}

impl IndexMut<usize> for MacroblockGrid {
    fn index_mut(&mut self, addr: usize) -> &mut Macroblock {
        &mut self.mbs[addr]
    }
}
