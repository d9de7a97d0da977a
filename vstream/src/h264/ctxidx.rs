//! Context index assignments, tables 9-34 and 9-40 to 9-43.

use crate::h264::types::BlockCat;

pub const MB_TYPE_SI_PREFIX: usize = 0;
pub const MB_TYPE_I: usize = 3;
pub const MB_SKIP_FLAG_P: usize = 11;
pub const MB_TYPE_P_PREFIX: usize = 14;
pub const MB_TYPE_P_SUFFIX: usize = 17;
pub const SUB_MB_TYPE_P: usize = 21;
pub const MB_SKIP_FLAG_B: usize = 24;
pub const MB_TYPE_B_PREFIX: usize = 27;
pub const MB_TYPE_B_SUFFIX: usize = 32;
pub const SUB_MB_TYPE_B: usize = 36;
pub const MVD_X: usize = 40;
pub const MVD_Y: usize = 47;
pub const REF_IDX: usize = 54;
pub const MB_QP_DELTA: usize = 60;
pub const INTRA_CHROMA_PRED_MODE: usize = 64;
pub const PREV_INTRA_PRED_MODE_FLAG: usize = 68;
pub const REM_INTRA_PRED_MODE: usize = 69;
pub const MB_FIELD_DECODING_FLAG: usize = 70;
pub const CODED_BLOCK_PATTERN_LUMA: usize = 73;
pub const CODED_BLOCK_PATTERN_CHROMA: usize = 77;

/// The bin decoded with `DecodeTerminate` rather than a context.
pub const TERMINATE: usize = 276;

pub const TRANSFORM_SIZE_8X8_FLAG: usize = 399;

/// Residual context bases by category, each listed for categories below 5,
/// then 5, 6 to 8, 9, 10 to 12 and 13.
struct ResidualBase([usize; 6]);

impl ResidualBase {
    fn get(&self, cat: BlockCat) -> usize {
        let group = match cat.index() {
            0..=4 => 0,
            5 => 1,
            6..=8 => 2,
            9 => 3,
            10..=12 => 4,
            _ => 5,
        };

        self.0[group]
    }
}

const CODED_BLOCK_FLAG: ResidualBase = ResidualBase([85, 1012, 460, 1012, 472, 1012]);
const SIGNIFICANT_FRAME: ResidualBase = ResidualBase([105, 402, 484, 660, 528, 718]);
const SIGNIFICANT_FIELD: ResidualBase = ResidualBase([277, 436, 776, 675, 820, 733]);
const LAST_FRAME: ResidualBase = ResidualBase([166, 417, 572, 690, 616, 748]);
const LAST_FIELD: ResidualBase = ResidualBase([338, 451, 864, 699, 908, 757]);
const ABS_LEVEL: ResidualBase = ResidualBase([227, 426, 952, 708, 982, 766]);

/// Table 9-40 `ctxBlockCatOffset`.
const CAT_OFFSET_CODED_BLOCK_FLAG: [usize; 14] = [0, 4, 8, 12, 16, 0, 0, 4, 8, 4, 0, 4, 8, 8];
const CAT_OFFSET_SIGNIFICANT: [usize; 14] = [0, 15, 29, 44, 47, 0, 0, 15, 29, 0, 0, 15, 29, 0];
const CAT_OFFSET_ABS_LEVEL: [usize; 14] = [0, 10, 20, 30, 39, 0, 0, 10, 20, 0, 0, 10, 20, 0];

pub fn coded_block_flag(cat: BlockCat) -> usize {
    CODED_BLOCK_FLAG.get(cat) + CAT_OFFSET_CODED_BLOCK_FLAG[cat.index()]
}

/// Base of `significant_coeff_flag`, or of `last_significant_coeff_flag`
/// when `last` is set.
pub fn significance(cat: BlockCat, field: bool, last: bool) -> usize {
    let base = match (last, field) {
        (false, false) => &SIGNIFICANT_FRAME,
        (false, true) => &SIGNIFICANT_FIELD,
        (true, false) => &LAST_FRAME,
        (true, true) => &LAST_FIELD,
    };

    base.get(cat) + CAT_OFFSET_SIGNIFICANT[cat.index()]
}

pub fn coeff_abs_level_minus1(cat: BlockCat) -> usize {
    ABS_LEVEL.get(cat) + CAT_OFFSET_ABS_LEVEL[cat.index()]
}

/// Table 9-43 increments of `significant_coeff_flag` in 8x8 frame blocks.
pub const SIGNIFICANT_8X8_FRAME: [u8; 63] = [
    0, 1, 2, 3, 4, 5, 5, 4, 4, 3, 3, 4, 4, 4, 5, 5, 4, 4, 4, 4, 3, 3, 6, 7, 7, 7, 8, 9, 10, 9, 8, 7,
    7, 6, 11, 12, 13, 11, 6, 7, 8, 9, 14, 10, 9, 8, 6, 11, 12, 13, 11, 6, 9, 14, 10, 9, 11, 12, 13,
    11, 14, 10, 12,
];

/// Table 9-43 increments of `significant_coeff_flag` in 8x8 field blocks.
pub const SIGNIFICANT_8X8_FIELD: [u8; 63] = [
    0, 1, 1, 2, 2, 3, 3, 4, 5, 6, 7, 7, 7, 8, 4, 5, 6, 9, 10, 10, 8, 11, 12, 11, 9, 9, 10, 10, 8, 11,
    12, 11, 9, 9, 10, 10, 8, 11, 12, 11, 9, 9, 10, 10, 8, 13, 13, 9, 9, 10, 10, 8, 13, 13, 9, 9, 10,
    10, 14, 14, 14, 14, 14,
];

/// Table 9-43 increments of `last_significant_coeff_flag` in 8x8 blocks.
pub const LAST_8X8: [u8; 63] = [
    0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
    3, 3, 3, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 6, 6, 7, 7, 7, 7, 8, 8, 8,
];
