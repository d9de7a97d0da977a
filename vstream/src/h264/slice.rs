//! Slice state and neighbor resolution (6.4)

use crate::error::{Error, Result};
use crate::h264::macroblock::{Macroblock, MacroblockGrid, UNAVAILABLE_INTER, UNAVAILABLE_INTRA};
use crate::h264::types::SliceType;
use log::debug;

bitflags! {
    /// Slice-wide options that change how neighbors are found.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct SliceFlags : u8 {
        /// `MbaffFrameFlag`: macroblocks are coded in vertical pairs, each
        /// pair either frame or field.
        const Mbaff = 0b1;

        /// `field_pic_flag`
        const FieldPic = 0b10;

        /// `constrained_intra_pred_flag`
        const ConstrainedIntraPred = 0b100;

        /// The slice is carried in data partitions A, B and C.
        const DataPartitioned = 0b1000;

        /// `transform_8x8_mode_flag`
        const Transform8x8Mode = 0b1_0000;

        /// `direct_8x8_inference_flag`
        const Direct8x8Inference = 0b10_0000;
    }
}

/// Slice header and parameter set fields the macroblock layer depends on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SliceParams {
    pub slice_type: SliceType,

    /// `first_mb_in_slice`. Under MBAFF this counts macroblock pairs.
    pub first_mb_in_slice: usize,

    pub flags: SliceFlags,

    /// `ChromaArrayType`: 0 for monochrome or separately coded planes, 1 for
    /// 4:2:0, 2 for 4:2:2 and 3 for 4:4:4.
    pub chroma_array_type: u8,

    /// `SliceQPY`
    pub slice_qp: i32,

    /// `num_ref_idx_l0_active_minus1` and `num_ref_idx_l1_active_minus1`
    pub num_ref_idx_active_minus1: [u32; 2],

    /// `BitDepthY`, the width of luma `I_PCM` samples.
    pub bit_depth_luma: u8,

    /// `BitDepthC`
    pub bit_depth_chroma: u8,
}

impl SliceParams {
    pub fn new(slice_type: SliceType) -> Self {
        Self {
            slice_type,
            first_mb_in_slice: 0,
            flags: SliceFlags::empty(),
            chroma_array_type: 1,
            slice_qp: 26,
            num_ref_idx_active_minus1: [0; 2],
            bit_depth_luma: 8,
            bit_depth_chroma: 8,
        }
    }
}

/// A neighbor position relative to the current macroblock or block: left,
/// above, above-right and above-left.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Neighbor {
    A,
    B,
    C,
    D,
}

/// Block geometry for `Slice::neighbor_block`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockSize {
    Luma4x4,
    Luma8x8,

    /// 4x4 chroma blocks, laid out according to the chroma format.
    Chroma,
}

/// A block found by `Slice::locate_block`.
#[derive(Copy, Clone, Debug)]
pub struct BlockNeighbor<'s> {
    pub mb: &'s Macroblock,
    pub idx: usize,

    /// The neighbor exists but is inter coded, and constrained intra
    /// prediction with data partitioning hides it from the current intra
    /// macroblock. `mb` is then `UNAVAILABLE_INTER`.
    pub filtered: bool,
}

/// A slice being coded, macroblock by macroblock, over a picture's grid.
pub struct Slice<'g> {
    grid: &'g mut MacroblockGrid,
    params: SliceParams,
    curr_mb_addr: usize,
    prev_mb_addr: Option<usize>,
}

impl<'g> Slice<'g> {
    /// Start a slice at its first macroblock.
    pub fn new(grid: &'g mut MacroblockGrid, params: SliceParams) -> Result<Self> {
        if params.chroma_array_type > 3 {
            return Err(Error::OutOfRange("ChromaArrayType above 3"));
        }
        if ![params.bit_depth_luma, params.bit_depth_chroma].iter().all(|d| (8..=14).contains(d)) {
            return Err(Error::OutOfRange("sample bit depth outside of 8 to 14"));
        }

        let first = params.first_mb_in_slice * (1 + usize::from(params.flags.contains(SliceFlags::Mbaff)));
        if first >= grid.len() {
            return Err(Error::OutOfRange("first_mb_in_slice outside of the picture"));
        }

        Ok(Self {
            grid,
            params,
            curr_mb_addr: first,
            prev_mb_addr: None,
        })
    }

    pub fn params(&self) -> &SliceParams {
        &self.params
    }

    pub fn grid(&self) -> &MacroblockGrid {
        self.grid
    }

    pub fn curr_mb_addr(&self) -> usize {
        self.curr_mb_addr
    }

    pub fn current(&self) -> &Macroblock {
        &self.grid[self.curr_mb_addr]
    }

    pub fn current_mut(&mut self) -> &mut Macroblock {
        &mut self.grid[self.curr_mb_addr]
    }

    /// The macroblock coded just before the current one in this slice.
    pub fn prev(&self) -> Option<&Macroblock> {
        self.prev_mb_addr.map(|addr| &self.grid[addr])
    }

    /// Move on to the next macroblock of the slice.
    pub fn advance(&mut self) -> Result<()> {
        let next = self
            .next_mb_addr(self.curr_mb_addr)
            .ok_or(Error::OutOfRange("no macroblock left in the slice group"))?;

        self.prev_mb_addr = Some(self.curr_mb_addr);
        self.curr_mb_addr = next;

        Ok(())
    }

    /// Set `mb_field_decoding_flag` of the current macroblock, and under
    /// MBAFF of the other macroblock of its pair.
    pub fn set_field_decoding(&mut self, field: bool) {
        let top = if self.is_mbaff() {
            self.curr_mb_addr & !1
        } else {
            self.curr_mb_addr
        };
        let pair = 1 + usize::from(self.is_mbaff());

        for addr in top..top + pair {
            if let Some(mb) = self.grid.get_mut(addr) {
                mb.mb_field_decoding_flag = field;
            }
        }
    }

    /// 8.2.2 `NextMbAddress`: the next address in the same slice group.
    pub fn next_mb_addr(&self, addr: usize) -> Option<usize> {
        let group = self.grid.slice_group(addr);
        (addr + 1..self.grid.len()).find(|&next| self.grid.slice_group(next) == group)
    }

    fn is_mbaff(&self) -> bool {
        self.params.flags.contains(SliceFlags::Mbaff)
    }

    /// Whether coefficients of the current macroblock are scanned as field
    /// samples.
    pub fn is_field(&self) -> bool {
        self.params.flags.contains(SliceFlags::FieldPic) || self.current().mb_field_decoding_flag
    }

    /// 6.4.1: whether `addr` has been coded in this slice already, or is the
    /// current macroblock.
    pub fn is_available(&self, addr: usize) -> bool {
        let first = self.params.first_mb_in_slice * (1 + usize::from(self.is_mbaff()));

        addr >= first
            && addr <= self.curr_mb_addr
            && addr < self.grid.len()
            && self.grid.slice_group(addr) == self.grid.slice_group(self.curr_mb_addr)
    }

    /// 6.4.9 and 6.4.10: the neighboring macroblock, or the top macroblock of
    /// the neighboring pair under MBAFF.
    pub fn neighbor_pair(&self, pos: Neighbor) -> Option<usize> {
        let width = self.grid.width();
        let mbaff = self.is_mbaff();
        let curr = if mbaff {
            self.curr_mb_addr / 2
        } else {
            self.curr_mb_addr
        };
        let column = curr % width;

        let addr = match pos {
            Neighbor::A if column == 0 => None,
            Neighbor::A => Some(curr - 1),
            Neighbor::B => curr.checked_sub(width),
            Neighbor::C if column + 1 == width => None,
            Neighbor::C => (curr + 1).checked_sub(width),
            Neighbor::D if column == 0 => None,
            Neighbor::D => curr.checked_sub(width + 1),
        }?;

        let addr = if mbaff { addr * 2 } else { addr };
        if self.is_available(addr) {
            Some(addr)
        } else {
            None
        }
    }

    fn is_frame_pair(&self, top: usize) -> bool {
        !self.grid[top].mb_field_decoding_flag
    }

    /// 6.4.12: locate luma or chroma sample (`x`, `y`), relative to the top
    /// left of the current macroblock, in a macroblock `max_w` by `max_h`
    /// samples large.
    ///
    /// Yields the address of the macroblock that covers the sample and the
    /// sample's position within it, or `None` if that macroblock is not
    /// available.
    pub fn neighbor_location(&self, x: i32, y: i32, max_w: i32, max_h: i32) -> Option<(usize, i32, i32)> {
        let pos = if x < 0 && y < 0 {
            Neighbor::D
        } else if x < 0 && y < max_h {
            Neighbor::A
        } else if x < max_w && y < 0 {
            Neighbor::B
        } else if x < max_w && y < max_h {
            return Some((self.curr_mb_addr, x, y));
        } else if y < 0 {
            Neighbor::C
        } else {
            return None;
        };

        let (addr, y_m) = if self.is_mbaff() {
            self.mbaff_location(pos, y, max_h)?
        } else {
            (self.neighbor_pair(pos)?, y)
        };

        Some((addr, (x + max_w) % max_w, (y_m + max_h) % max_h))
    }

    /// Table 6-4.
    fn mbaff_location(&self, pos: Neighbor, y: i32, max_h: i32) -> Option<(usize, i32)> {
        let curr = self.curr_mb_addr;
        let curr_frame = !self.grid[curr].mb_field_decoding_flag;
        let top = curr % 2 == 0;

        let located = match (pos, curr_frame, top) {
            (Neighbor::D, true, true) => (self.neighbor_pair(Neighbor::D)? + 1, y),
            (Neighbor::D, true, false) => {
                let a = self.neighbor_pair(Neighbor::A)?;
                if self.is_frame_pair(a) {
                    (a, y)
                } else {
                    (a, (y + max_h) >> 1)
                }
            }
            (Neighbor::D, false, true) => {
                let d = self.neighbor_pair(Neighbor::D)?;
                if self.is_frame_pair(d) {
                    (d + 1, 2 * y)
                } else {
                    (d, y)
                }
            }
            (Neighbor::D, false, false) => (self.neighbor_pair(Neighbor::D)? + 1, y),

            (Neighbor::A, true, _) => {
                let a = self.neighbor_pair(Neighbor::A)?;
                let parity = usize::from(y % 2 != 0);
                match (self.is_frame_pair(a), top) {
                    (true, true) => (a, y),
                    (true, false) => (a + 1, y),
                    (false, true) => (a + parity, y >> 1),
                    (false, false) => (a + parity, (y + max_h) >> 1),
                }
            }
            (Neighbor::A, false, _) => {
                let a = self.neighbor_pair(Neighbor::A)?;
                let bottom = i32::from(!top);
                match (self.is_frame_pair(a), y < max_h / 2) {
                    (true, true) => (a, (y << 1) + bottom),
                    (true, false) => (a + 1, (y << 1) + bottom - max_h),
                    (false, _) => (a + usize::from(!top), y),
                }
            }

            (Neighbor::B, true, true) => (self.neighbor_pair(Neighbor::B)? + 1, y),
            (Neighbor::B, true, false) => (curr - 1, y),
            (Neighbor::B, false, true) => {
                let b = self.neighbor_pair(Neighbor::B)?;
                if self.is_frame_pair(b) {
                    (b + 1, 2 * y)
                } else {
                    (b, y)
                }
            }
            (Neighbor::B, false, false) => (self.neighbor_pair(Neighbor::B)? + 1, y),

            (Neighbor::C, true, true) => (self.neighbor_pair(Neighbor::C)? + 1, y),
            (Neighbor::C, true, false) => return None,
            (Neighbor::C, false, true) => {
                let c = self.neighbor_pair(Neighbor::C)?;
                if self.is_frame_pair(c) {
                    (c + 1, 2 * y)
                } else {
                    (c, y)
                }
            }
            (Neighbor::C, false, false) => (self.neighbor_pair(Neighbor::C)? + 1, y),
        };

        Some(located)
    }

    /// What an unavailable neighbor looks like from the current macroblock.
    fn unavailable(&self) -> &'static Macroblock {
        if self.current().mb_type.is_inter() {
            &UNAVAILABLE_INTER
        } else {
            &UNAVAILABLE_INTRA
        }
    }

    /// Resolve an address to a record, substituting the sentinels for
    /// unavailable macroblocks and, under constrained intra prediction with
    /// data partitioning, for inter macroblocks seen from intra ones. The
    /// flag tells whether the second substitution happened.
    fn resolve(&self, addr: Option<usize>) -> (&Macroblock, bool) {
        let Some(mb) = addr.and_then(|addr| self.grid.get(addr)) else {
            return (self.unavailable(), false);
        };

        let constrained = SliceFlags::ConstrainedIntraPred | SliceFlags::DataPartitioned;
        if self.params.flags.contains(constrained)
            && self.current().mb_type.is_intra()
            && mb.mb_type.is_inter()
        {
            debug!("inter neighbor of macroblock {} filtered out", self.curr_mb_addr);
            return (&UNAVAILABLE_INTER, true);
        }

        (mb, false)
    }

    fn mb_location(pos: Neighbor) -> (i32, i32) {
        match pos {
            Neighbor::A => (-1, 0),
            Neighbor::B => (0, -1),
            Neighbor::C => (16, -1),
            Neighbor::D => (-1, -1),
        }
    }

    /// 6.4.11.1: the address of the macroblock next to the current one.
    pub fn neighbor_mb_addr(&self, pos: Neighbor) -> Option<usize> {
        let (x, y) = Self::mb_location(pos);
        self.neighbor_location(x, y, 16, 16).map(|(addr, _, _)| addr)
    }

    /// The record of the macroblock next to the current one.
    pub fn neighbor_mb(&self, pos: Neighbor) -> &Macroblock {
        self.resolve(self.neighbor_mb_addr(pos)).0
    }

    /// 6.4.11.2 through 6.4.11.5: the block next to block `idx` of the
    /// current macroblock, as its macroblock's record and its index there.
    ///
    /// Unavailable blocks resolve to a sentinel record and index 0.
    pub fn neighbor_block(&self, pos: Neighbor, size: BlockSize, idx: usize) -> (&Macroblock, usize) {
        let located = self.locate_block(pos, size, idx);
        (located.mb, located.idx)
    }

    /// `neighbor_block`, also telling apart a neighbor hidden by constrained
    /// intra prediction from one that does not exist.
    pub fn locate_block(&self, pos: Neighbor, size: BlockSize, idx: usize) -> BlockNeighbor<'_> {
        let missing = BlockNeighbor {
            mb: self.unavailable(),
            idx: 0,
            filtered: false,
        };

        let idx = idx as i32;
        let (x, y, width, max_h) = match size {
            BlockSize::Luma4x4 => (
                (idx / 4 % 2) * 8 + (idx % 4 % 2) * 4,
                (idx / 4 / 2) * 8 + (idx % 4 / 2) * 4,
                4,
                16,
            ),
            BlockSize::Luma8x8 => ((idx % 2) * 8, (idx / 2) * 8, 8, 16),
            BlockSize::Chroma => {
                let max_h = if self.params.chroma_array_type == 2 { 16 } else { 8 };
                ((idx % 2) * 4, (idx / 2) * 4, 4, max_h)
            }
        };
        let max_w = if size == BlockSize::Chroma { 8 } else { 16 };

        let (dx, dy) = match pos {
            Neighbor::A => (-1, 0),
            Neighbor::B => (0, -1),
            Neighbor::C => (width, -1),
            Neighbor::D => (-1, -1),
        };

        let Some((addr, x_w, y_w)) = self.neighbor_location(x + dx, y + dy, max_w, max_h) else {
            return missing;
        };

        let idx_n = match size {
            BlockSize::Luma4x4 => 8 * (y_w / 8) + 4 * (x_w / 8) + 2 * ((y_w % 8) / 4) + (x_w % 8) / 4,
            BlockSize::Luma8x8 => 2 * (y_w / 8) + x_w / 8,
            BlockSize::Chroma => 2 * (y_w / 4) + x_w / 4,
        };

        if addr == self.curr_mb_addr && idx_n > idx {
            return missing;
        }

        let (mb, filtered) = self.resolve(Some(addr));
        BlockNeighbor {
            mb,
            idx: idx_n as usize,
            filtered,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::h264::macroblock::MacroblockGrid;
    use crate::h264::slice::{BlockSize, Neighbor, Slice, SliceFlags, SliceParams};
    use crate::h264::types::{MbType, SliceType};

    /// An 8x3 picture whose records carry their own address in `mb_qp_delta`.
    fn grid(width: usize, height: usize) -> MacroblockGrid {
        let mut grid = MacroblockGrid::new(width, height);
        for addr in 0..grid.len() {
            grid[addr].mb_type = MbType::P16x16;
            grid[addr].mb_qp_delta = addr as i32;
        }

        grid
    }

    fn slice_at<'g>(grid: &'g mut MacroblockGrid, params: SliceParams, addr: usize) -> Slice<'g> {
        let mut slice = Slice::new(grid, params).unwrap();
        while slice.curr_mb_addr() < addr {
            slice.advance().unwrap();
        }

        slice
    }

    #[test]
    fn macroblock_neighbors() {
        let mut grid = grid(8, 3);
        let slice = slice_at(&mut grid, SliceParams::new(SliceType::P), 9);

        assert_eq!(Some(8), slice.neighbor_pair(Neighbor::A));
        assert_eq!(Some(1), slice.neighbor_pair(Neighbor::B));
        assert_eq!(Some(2), slice.neighbor_pair(Neighbor::C));
        assert_eq!(Some(0), slice.neighbor_pair(Neighbor::D));
        assert_eq!(2, slice.neighbor_mb(Neighbor::C).mb_qp_delta);
        assert_eq!(Some(8), slice.prev().map(|mb| mb.mb_qp_delta as usize));
    }

    #[test]
    fn picture_edges() {
        let mut grid = grid(8, 3);
        let slice = slice_at(&mut grid, SliceParams::new(SliceType::P), 8);
        assert_eq!(None, slice.neighbor_pair(Neighbor::A));
        assert_eq!(None, slice.neighbor_pair(Neighbor::D));
        assert_eq!(Some(1), slice.neighbor_pair(Neighbor::C));

        let mut grid = self::grid(8, 3);
        let slice = slice_at(&mut grid, SliceParams::new(SliceType::P), 15);
        assert_eq!(None, slice.neighbor_pair(Neighbor::C));
        assert_eq!(Some(6), slice.neighbor_pair(Neighbor::D));

        let mut grid = self::grid(8, 3);
        let slice = slice_at(&mut grid, SliceParams::new(SliceType::P), 3);
        assert_eq!(None, slice.neighbor_pair(Neighbor::B));
        assert_eq!(MbType::Unavailable, slice.neighbor_mb(Neighbor::B).mb_type);
    }

    #[test]
    fn slice_boundaries() {
        let mut params = SliceParams::new(SliceType::P);
        params.first_mb_in_slice = 2;

        let mut grid = grid(8, 3);
        let slice = slice_at(&mut grid, params, 9);
        assert_eq!(Some(8), slice.neighbor_pair(Neighbor::A));
        assert_eq!(None, slice.neighbor_pair(Neighbor::B));
        assert_eq!(Some(2), slice.neighbor_pair(Neighbor::C));
        assert_eq!(None, slice.neighbor_pair(Neighbor::D));
        assert!(!slice.is_available(10));
    }

    #[test]
    fn slice_groups() {
        let map = (0..24).map(|addr| (addr % 2) as u32).collect();
        let mut grid = grid(8, 3).with_slice_groups(map).unwrap();
        let mut slice = Slice::new(&mut grid, SliceParams::new(SliceType::P)).unwrap();

        slice.advance().unwrap();
        assert_eq!(2, slice.curr_mb_addr());
        while slice.curr_mb_addr() < 10 {
            slice.advance().unwrap();
        }

        assert_eq!(None, slice.neighbor_pair(Neighbor::A));
        assert_eq!(Some(2), slice.neighbor_pair(Neighbor::B));
        assert_eq!(None, slice.neighbor_pair(Neighbor::C));
        assert_eq!(Some(8), slice.prev().map(|mb| mb.mb_qp_delta as usize));

        while slice.curr_mb_addr() < 22 {
            slice.advance().unwrap();
        }
        assert_eq!(
            Error::OutOfRange("no macroblock left in the slice group"),
            slice.advance().unwrap_err()
        );
    }

    #[test]
    fn luma_block_neighbors() {
        let mut grid = grid(8, 3);
        let slice = slice_at(&mut grid, SliceParams::new(SliceType::P), 9);

        let at = |pos, size, idx| {
            let (mb, idx_n) = slice.neighbor_block(pos, size, idx);
            (mb.mb_qp_delta, idx_n)
        };

        assert_eq!((8, 5), at(Neighbor::A, BlockSize::Luma4x4, 0));
        assert_eq!((1, 10), at(Neighbor::B, BlockSize::Luma4x4, 0));
        assert_eq!((0, 15), at(Neighbor::D, BlockSize::Luma4x4, 0));
        assert_eq!((2, 10), at(Neighbor::C, BlockSize::Luma4x4, 5));
        assert_eq!((9, 4), at(Neighbor::A, BlockSize::Luma4x4, 5));
        assert_eq!((9, 1), at(Neighbor::C, BlockSize::Luma4x4, 2));
        assert_eq!((8, 13), at(Neighbor::A, BlockSize::Luma4x4, 8));

        assert_eq!((9, 1), at(Neighbor::C, BlockSize::Luma8x8, 2));
        assert_eq!((1, 3), at(Neighbor::B, BlockSize::Luma8x8, 1));
        assert_eq!((2, 2), at(Neighbor::C, BlockSize::Luma8x8, 1));

        let (mb, idx) = slice.neighbor_block(Neighbor::C, BlockSize::Luma4x4, 3);
        assert_eq!((MbType::Unavailable, 0), (mb.mb_type, idx));
        let (mb, _) = slice.neighbor_block(Neighbor::C, BlockSize::Luma8x8, 3);
        assert_eq!(MbType::Unavailable, mb.mb_type);
    }

    #[test]
    fn chroma_block_neighbors() {
        let mut grid = grid(8, 3);
        let slice = slice_at(&mut grid, SliceParams::new(SliceType::P), 9);
        let (mb, idx) = slice.neighbor_block(Neighbor::B, BlockSize::Chroma, 0);
        assert_eq!((1, 2), (mb.mb_qp_delta, idx));
        let (mb, idx) = slice.neighbor_block(Neighbor::A, BlockSize::Chroma, 2);
        assert_eq!((8, 3), (mb.mb_qp_delta, idx));

        let mut params = SliceParams::new(SliceType::P);
        params.chroma_array_type = 2;
        let mut grid = self::grid(8, 3);
        let slice = slice_at(&mut grid, params, 9);
        let (mb, idx) = slice.neighbor_block(Neighbor::B, BlockSize::Chroma, 0);
        assert_eq!((1, 6), (mb.mb_qp_delta, idx));
        let (mb, idx) = slice.neighbor_block(Neighbor::A, BlockSize::Chroma, 6);
        assert_eq!((8, 7), (mb.mb_qp_delta, idx));
    }

    #[test]
    fn unavailable_sentinels_follow_the_current_macroblock() {
        let mut grid = grid(8, 3);
        let mut slice = slice_at(&mut grid, SliceParams::new(SliceType::P), 0);
        assert!(!slice.neighbor_mb(Neighbor::A).coded_block_flag[0][0]);

        slice.current_mut().mb_type = MbType::INxN;
        assert!(slice.neighbor_mb(Neighbor::A).coded_block_flag[0][0]);
    }

    #[test]
    fn constrained_intra_filter() {
        let mut params = SliceParams::new(SliceType::P);
        params.flags = SliceFlags::ConstrainedIntraPred | SliceFlags::DataPartitioned;

        let mut grid = grid(8, 3);
        grid[1].mb_type = MbType::INxN;
        let mut slice = slice_at(&mut grid, params, 9);
        slice.current_mut().mb_type = MbType::INxN;

        assert_eq!(MbType::Unavailable, slice.neighbor_mb(Neighbor::A).mb_type);
        assert_eq!(MbType::INxN, slice.neighbor_mb(Neighbor::B).mb_type);

        let hidden = slice.locate_block(Neighbor::A, BlockSize::Luma4x4, 0);
        assert!(hidden.filtered);
        assert_eq!((MbType::Unavailable, 5), (hidden.mb.mb_type, hidden.idx));
        assert!(!slice.locate_block(Neighbor::B, BlockSize::Luma4x4, 0).filtered);

        // Outside of the picture is missing, not hidden.
        let mut grid = self::grid(8, 3);
        let mut slice = slice_at(&mut grid, params, 8);
        slice.current_mut().mb_type = MbType::INxN;
        let missing = slice.locate_block(Neighbor::A, BlockSize::Luma4x4, 0);
        assert!(!missing.filtered);
        assert_eq!(MbType::Unavailable, missing.mb.mb_type);

        slice.current_mut().mb_type = MbType::P16x16;
        assert_eq!(MbType::P16x16, slice.neighbor_mb(Neighbor::A).mb_type);
    }

    /// An MBAFF picture eight pairs wide and two pairs high.
    fn mbaff(curr: usize, curr_field: bool, neighbors_field: bool) -> MacroblockGrid {
        let mut grid = grid(8, 4);
        for addr in 0..grid.len() {
            grid[addr].mb_field_decoding_flag = neighbors_field;
        }
        grid[curr & !1].mb_field_decoding_flag = curr_field;
        grid[curr | 1].mb_field_decoding_flag = curr_field;

        grid
    }

    fn mbaff_params() -> SliceParams {
        let mut params = SliceParams::new(SliceType::P);
        params.flags = SliceFlags::Mbaff;
        params
    }

    #[test]
    fn mbaff_pairs() {
        let mut grid = mbaff(18, false, false);
        let slice = slice_at(&mut grid, mbaff_params(), 18);
        assert_eq!(Some(16), slice.neighbor_pair(Neighbor::A));
        assert_eq!(Some(2), slice.neighbor_pair(Neighbor::B));
        assert_eq!(Some(4), slice.neighbor_pair(Neighbor::C));
        assert_eq!(Some(0), slice.neighbor_pair(Neighbor::D));

        let mut params = mbaff_params();
        params.first_mb_in_slice = 1;
        let mut grid = mbaff(18, false, false);
        let slice = slice_at(&mut grid, params, 18);
        assert!(slice.is_available(2));
        assert_eq!(None, slice.neighbor_pair(Neighbor::D));
    }

    #[test]
    fn mbaff_above_neighbors() {
        let cases = [
            // (current, current is field, neighbors are field, expected B)
            (18, false, false, Some(3)),
            (19, false, false, Some(18)),
            (19, false, true, Some(18)),
            (18, true, true, Some(2)),
            (18, true, false, Some(3)),
            (19, true, false, Some(3)),
            (19, true, true, Some(3)),
        ];

        for (curr, curr_field, neighbors_field, expected) in cases {
            let mut grid = mbaff(curr, curr_field, neighbors_field);
            let slice = slice_at(&mut grid, mbaff_params(), curr);
            assert_eq!(
                expected,
                slice.neighbor_mb_addr(Neighbor::B),
                "macroblock {} field {} neighbors field {}",
                curr,
                curr_field,
                neighbors_field
            );
        }

        let mut grid = mbaff(19, false, false);
        let slice = slice_at(&mut grid, mbaff_params(), 19);
        assert_eq!(None, slice.neighbor_mb_addr(Neighbor::C));
        assert_eq!(Some(16), slice.neighbor_mb_addr(Neighbor::D));

        let mut grid = mbaff(18, true, false);
        let slice = slice_at(&mut grid, mbaff_params(), 18);
        assert_eq!(Some(5), slice.neighbor_mb_addr(Neighbor::C));
        assert_eq!(Some(1), slice.neighbor_mb_addr(Neighbor::D));
    }

    #[test]
    fn mbaff_left_neighbors() {
        let at = |curr, curr_field, neighbors_field, idx| {
            let mut grid = mbaff(curr, curr_field, neighbors_field);
            let slice = slice_at(&mut grid, mbaff_params(), curr);
            let (mb, idx_n) = slice.neighbor_block(Neighbor::A, BlockSize::Luma4x4, idx);
            (mb.mb_qp_delta, idx_n)
        };

        // Frame macroblock next to a field pair: rows alternate between the
        // two fields.
        assert_eq!((16, 5), at(18, false, true, 2));
        assert_eq!((16, 7), at(18, false, true, 8));
        assert_eq!((16, 13), at(19, false, true, 0));

        // Field macroblock next to a frame pair.
        assert_eq!((17, 5), at(18, true, false, 8));
        assert_eq!((16, 5), at(18, true, false, 0));
        assert_eq!((17, 13), at(19, true, false, 10));

        // Matching pairs line up.
        assert_eq!((17, 13), at(19, true, true, 8));
        assert_eq!((17, 7), at(19, false, false, 2));
    }

    #[test]
    fn pair_field_decoding() {
        let fields = |grid: &MacroblockGrid| {
            (0..grid.len())
                .filter(|&addr| grid[addr].mb_field_decoding_flag)
                .collect::<Vec<_>>()
        };

        let mut pairs = mbaff(18, false, false);
        let mut slice = slice_at(&mut pairs, mbaff_params(), 17);
        slice.set_field_decoding(true);
        assert!(slice.is_field());
        assert_eq!(vec![16, 17], fields(&pairs));

        let mut single = grid(8, 3);
        let mut slice = slice_at(&mut single, SliceParams::new(SliceType::P), 9);
        slice.set_field_decoding(true);
        assert_eq!(vec![9], fields(&single));
    }

    #[test]
    fn bit_depth_range() {
        let mut params = SliceParams::new(SliceType::I);
        params.bit_depth_chroma = 15;
        assert_eq!(
            Some(Error::OutOfRange("sample bit depth outside of 8 to 14")),
            Slice::new(&mut grid(2, 2), params).err()
        );

        params.bit_depth_chroma = 14;
        params.bit_depth_luma = 9;
        assert!(Slice::new(&mut grid(2, 2), params).is_ok());
    }
}
