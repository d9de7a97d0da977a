//! ITU-T Recommendation H.264 (08/2021) macroblock layer syntax.
//!
//! Syntax elements are free functions over a `Bitstream`, an optional
//! `Cabac` engine and the `Slice` being coded. Passing `None` for the engine
//! selects the CAVLC binarization of an element. The functions never store
//! the value they transfer into the current `Macroblock`: callers walk the
//! grammar, keep the grid up to date, and rely on the stored records for the
//! context of later elements. Residual blocks are the exception, as their
//! coding contexts are per block rather than per element.
//!
//! `slice_data` and `macroblock_layer` walk that grammar for whole slices.

mod binarization;
mod cavlc;
mod ctxidx;
mod macroblock;
mod mb;
mod residual;
mod slice;
mod slice_data;
mod types;

pub use cavlc::{coeff_token, level, run_before, total_zeros, CoeffToken, TotalZerosTable};
pub use macroblock::{Macroblock, MacroblockGrid, UNAVAILABLE_INTER, UNAVAILABLE_INTRA};
pub use mb::{
    coded_block_pattern, end_of_slice_flag, intra_chroma_pred_mode, mb_field_decoding_flag,
    mb_qp_delta, mb_skip_flag, mb_skip_run, mb_type, mvd, prev_intra_pred_mode_flag, ref_idx,
    rem_intra_pred_mode, sub_mb_type, transform_size_8x8_flag,
};
pub use residual::{residual, residual_block, Residual};
pub use slice::{BlockNeighbor, BlockSize, Neighbor, Slice, SliceFlags, SliceParams};
pub use slice_data::{infer_skip, macroblock_layer, slice_data, MacroblockData};
pub use types::{BlockCat, MbType, Pred, SliceType, SubMbType};
