//! Macroblock and block types

use crate::error::{Error, Result};

/// 7.4.3 `slice_type`, reduced modulo 5.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SliceType {
    P,
    B,
    I,
    SP,
    SI,
}

impl SliceType {
    /// Interpret a coded `slice_type`. Values 5 to 9 carry the same type as
    /// the value five below them.
    pub fn from_raw(raw: u32) -> Result<Self> {
        Ok(match raw {
            0 | 5 => Self::P,
            1 | 6 => Self::B,
            2 | 7 => Self::I,
            3 | 8 => Self::SP,
            4 | 9 => Self::SI,
            _ => return Err(Error::OutOfRange("slice_type above 9")),
        })
    }

    pub fn is_p(self) -> bool {
        matches!(self, Self::P | Self::SP)
    }
}

/// Which reference lists a partition predicts from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pred {
    L0,
    L1,

    /// Both lists.
    Bi,
}

impl Pred {
    const ALL: [Pred; 3] = [Pred::L0, Pred::L1, Pred::Bi];

    fn index(self) -> u32 {
        match self {
            Self::L0 => 0,
            Self::L1 => 1,
            Self::Bi => 2,
        }
    }

    /// Whether the partition uses reference list `list`.
    pub fn uses(self, list: usize) -> bool {
        match self {
            Self::L0 => list == 0,
            Self::L1 => list == 1,
            Self::Bi => true,
        }
    }
}

/// Two-partition B macroblocks in `mb_type` order, tables 7-14 and 9-37.
const B_PAIRS: [(Pred, Pred); 9] = [
    (Pred::L0, Pred::L0),
    (Pred::L1, Pred::L1),
    (Pred::L0, Pred::L1),
    (Pred::L1, Pred::L0),
    (Pred::L0, Pred::Bi),
    (Pred::L1, Pred::Bi),
    (Pred::Bi, Pred::L0),
    (Pred::Bi, Pred::L1),
    (Pred::Bi, Pred::Bi),
];

/// Tables 7-11 through 7-14 `mb_type`.
///
/// Skipped macroblocks are represented here too, so that a macroblock record
/// fully describes how its neighbors should treat it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MbType {
    /// Stands in for a macroblock outside of the slice or the picture.
    Unavailable,

    /// `I_NxN`: Intra 4x4 or, with `transform_size_8x8_flag`, Intra 8x8.
    INxN,

    /// `I_16x16_<pred_mode>_<cbp_chroma>_<cbp_luma>`.
    ///
    /// The coded block pattern is carried by the type: `cbp_chroma` is 0, 1
    /// or 2, and `cbp_luma_all` stands for a luma pattern of 15 rather than 0.
    I16x16 {
        pred_mode: u8,
        cbp_chroma: u8,
        cbp_luma_all: bool,
    },

    IPcm,

    /// `SI`, only in SI slices.
    Si,

    P16x16,
    P16x8,
    P8x16,
    P8x8,

    /// `P_8x8ref0`. CAVLC only.
    P8x8Ref0,
    PSkip,

    BDirect16x16,
    B16x16(Pred),
    B16x8(Pred, Pred),
    B8x16(Pred, Pred),
    B8x8,
    BSkip,
}

impl MbType {
    pub fn is_available(self) -> bool {
        self != Self::Unavailable
    }

    pub fn is_skip(self) -> bool {
        matches!(self, Self::PSkip | Self::BSkip)
    }

    pub fn is_intra(self) -> bool {
        matches!(self, Self::INxN | Self::I16x16 { .. } | Self::IPcm | Self::Si)
    }

    pub fn is_inter(self) -> bool {
        self.is_available() && !self.is_intra()
    }

    pub fn is_i16x16(self) -> bool {
        matches!(self, Self::I16x16 { .. })
    }

    /// Whether motion comes entirely from direct prediction.
    pub fn is_direct(self) -> bool {
        matches!(self, Self::BDirect16x16 | Self::BSkip)
    }

    /// Whether the macroblock is split into sub-macroblocks.
    pub fn has_sub_mb(self) -> bool {
        matches!(self, Self::P8x8 | Self::P8x8Ref0 | Self::B8x8)
    }

    /// Raw value of an intra type within table 7-11.
    fn intra_raw(self) -> Result<u32> {
        match self {
            Self::INxN => Ok(0),
            Self::I16x16 {
                pred_mode,
                cbp_chroma,
                cbp_luma_all,
            } => {
                if pred_mode > 3 || cbp_chroma > 2 {
                    return Err(Error::OutOfRange("Intra 16x16 field out of range"));
                }

                Ok(1 + u32::from(pred_mode) + 4 * u32::from(cbp_chroma) + 12 * u32::from(cbp_luma_all))
            }
            Self::IPcm => Ok(25),
            _ => Err(Error::OutOfRange("mb_type not allowed in this slice type")),
        }
    }

    fn from_intra_raw(raw: u32) -> Result<Self> {
        Ok(match raw {
            0 => Self::INxN,
            1..=24 => {
                let n = raw - 1;
                Self::I16x16 {
                    pred_mode: (n % 4) as u8,
                    cbp_chroma: (n / 4 % 3) as u8,
                    cbp_luma_all: n >= 12,
                }
            }
            25 => Self::IPcm,
            _ => return Err(Error::OutOfRange("mb_type above its table")),
        })
    }

    /// The coded `mb_type` value of this type in a slice of `slice_type`.
    ///
    /// Intra types in inter slices follow the slice's own types, and skipped
    /// types have no coded value.
    pub fn to_raw(self, slice_type: SliceType) -> Result<u32> {
        let invalid = Error::OutOfRange("mb_type not allowed in this slice type");

        match slice_type {
            SliceType::I => self.intra_raw(),
            SliceType::SI => match self {
                Self::Si => Ok(0),
                _ => Ok(1 + self.intra_raw()?),
            },
            SliceType::P | SliceType::SP => match self {
                Self::P16x16 => Ok(0),
                Self::P16x8 => Ok(1),
                Self::P8x16 => Ok(2),
                Self::P8x8 => Ok(3),
                Self::P8x8Ref0 => Ok(4),
                _ if self.is_intra() => Ok(5 + self.intra_raw()?),
                _ => Err(invalid),
            },
            SliceType::B => match self {
                Self::BDirect16x16 => Ok(0),
                Self::B16x16(pred) => Ok(1 + pred.index()),
                Self::B16x8(first, second) | Self::B8x16(first, second) => {
                    let pair = B_PAIRS
                        .iter()
                        .position(|&p| p == (first, second))
                        .ok_or(invalid)?;
                    let shape = u32::from(matches!(self, Self::B8x16(..)));

                    Ok(4 + 2 * pair as u32 + shape)
                }
                Self::B8x8 => Ok(22),
                _ if self.is_intra() => Ok(23 + self.intra_raw()?),
                _ => Err(invalid),
            },
        }
    }

    /// Interpret a coded `mb_type` value in a slice of `slice_type`.
    pub fn from_raw(slice_type: SliceType, raw: u32) -> Result<Self> {
        match slice_type {
            SliceType::I => Self::from_intra_raw(raw),
            SliceType::SI => match raw {
                0 => Ok(Self::Si),
                _ => Self::from_intra_raw(raw - 1),
            },
            SliceType::P | SliceType::SP => match raw {
                0 => Ok(Self::P16x16),
                1 => Ok(Self::P16x8),
                2 => Ok(Self::P8x16),
                3 => Ok(Self::P8x8),
                4 => Ok(Self::P8x8Ref0),
                _ => Self::from_intra_raw(raw - 5),
            },
            SliceType::B => match raw {
                0 => Ok(Self::BDirect16x16),
                1..=3 => Ok(Self::B16x16(Pred::ALL[raw as usize - 1])),
                4..=21 => {
                    let k = raw as usize - 4;
                    let (first, second) = B_PAIRS[k / 2];
                    Ok(if k % 2 == 0 {
                        Self::B16x8(first, second)
                    } else {
                        Self::B8x16(first, second)
                    })
                }
                22 => Ok(Self::B8x8),
                _ => Self::from_intra_raw(raw - 23),
            },
        }
    }
}

/// Tables 7-17 and 7-18 `sub_mb_type`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SubMbType {
    P8x8,
    P8x4,
    P4x8,
    P4x4,
    BDirect8x8,
    B8x8(Pred),
    B8x4(Pred),
    B4x8(Pred),
    B4x4(Pred),
}

impl SubMbType {
    pub fn is_direct(self) -> bool {
        self == Self::BDirect8x8
    }

    /// Whether the sub-macroblock uses reference list `list`.
    pub fn uses(self, list: usize) -> bool {
        match self {
            Self::P8x8 | Self::P8x4 | Self::P4x8 | Self::P4x4 => list == 0,
            Self::BDirect8x8 => false,
            Self::B8x8(pred) | Self::B8x4(pred) | Self::B4x8(pred) | Self::B4x4(pred) => {
                pred.uses(list)
            }
        }
    }

    pub fn to_raw(self, slice_type: SliceType) -> Result<u32> {
        let raw = match (slice_type, self) {
            (SliceType::P | SliceType::SP, Self::P8x8) => 0,
            (SliceType::P | SliceType::SP, Self::P8x4) => 1,
            (SliceType::P | SliceType::SP, Self::P4x8) => 2,
            (SliceType::P | SliceType::SP, Self::P4x4) => 3,
            (SliceType::B, Self::BDirect8x8) => 0,
            (SliceType::B, Self::B8x8(pred)) => 1 + pred.index(),
            (SliceType::B, Self::B8x4(pred)) => 4 + 2 * pred.index(),
            (SliceType::B, Self::B4x8(pred)) => 5 + 2 * pred.index(),
            (SliceType::B, Self::B4x4(pred)) => 10 + pred.index(),
            _ => return Err(Error::OutOfRange("sub_mb_type not allowed in this slice type")),
        };

        Ok(raw)
    }

    pub fn from_raw(slice_type: SliceType, raw: u32) -> Result<Self> {
        let out_of_range = Error::OutOfRange("sub_mb_type above its table");

        match slice_type {
            SliceType::P | SliceType::SP => match raw {
                0 => Ok(Self::P8x8),
                1 => Ok(Self::P8x4),
                2 => Ok(Self::P4x8),
                3 => Ok(Self::P4x4),
                _ => Err(out_of_range),
            },
            SliceType::B => match raw {
                0 => Ok(Self::BDirect8x8),
                1..=3 => Ok(Self::B8x8(Pred::ALL[raw as usize - 1])),
                4..=9 => {
                    let k = raw as usize - 4;
                    let pred = Pred::ALL[k / 2];
                    Ok(if k % 2 == 0 {
                        Self::B8x4(pred)
                    } else {
                        Self::B4x8(pred)
                    })
                }
                10..=12 => Ok(Self::B4x4(Pred::ALL[raw as usize - 10])),
                _ => Err(out_of_range),
            },
            _ => Err(Error::OutOfRange("sub_mb_type not allowed in this slice type")),
        }
    }
}

/// Table 9-42 `ctxBlockCat`: the kind of transform block being coded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockCat {
    LumaDc = 0,
    LumaAc = 1,
    Luma4x4 = 2,
    ChromaDc = 3,
    ChromaAc = 4,
    Luma8x8 = 5,
    CbDc = 6,
    CbAc = 7,
    Cb4x4 = 8,
    Cb8x8 = 9,
    CrDc = 10,
    CrAc = 11,
    Cr4x4 = 12,
    Cr8x8 = 13,
}

impl BlockCat {
    pub fn index(self) -> usize {
        self as usize
    }

    /// The colour plane of a block coded like luma: 0 for Y, 1 for Cb and 2
    /// for Cr. The 4:2:0 and 4:2:2 chroma categories have none.
    pub fn luma_plane(self) -> Option<usize> {
        match self {
            Self::LumaDc | Self::LumaAc | Self::Luma4x4 | Self::Luma8x8 => Some(0),
            Self::CbDc | Self::CbAc | Self::Cb4x4 | Self::Cb8x8 => Some(1),
            Self::CrDc | Self::CrAc | Self::Cr4x4 | Self::Cr8x8 => Some(2),
            Self::ChromaDc | Self::ChromaAc => None,
        }
    }

    /// Whether the block is the DC of an Intra 16x16 plane.
    pub fn is_luma_dc(self) -> bool {
        matches!(self, Self::LumaDc | Self::CbDc | Self::CrDc)
    }

    /// Whether the block is the AC part of an Intra 16x16 4x4 block.
    pub fn is_luma_ac(self) -> bool {
        matches!(self, Self::LumaAc | Self::CbAc | Self::CrAc)
    }

    pub fn is_8x8(self) -> bool {
        matches!(self, Self::Luma8x8 | Self::Cb8x8 | Self::Cr8x8)
    }

    /// The categories of the DC, AC, 4x4 and 8x8 blocks of a luma-like plane.
    pub(crate) fn plane_cats(plane: usize) -> [BlockCat; 4] {
        match plane {
            0 => [Self::LumaDc, Self::LumaAc, Self::Luma4x4, Self::Luma8x8],
            1 => [Self::CbDc, Self::CbAc, Self::Cb4x4, Self::Cb8x8],
            _ => [Self::CrDc, Self::CrAc, Self::Cr4x4, Self::Cr8x8],
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::h264::types::{MbType, Pred, SliceType, SubMbType};

    #[test]
    fn mb_type_numbering() {
        let i16 = MbType::I16x16 {
            pred_mode: 2,
            cbp_chroma: 1,
            cbp_luma_all: true,
        };
        assert_eq!(19, i16.to_raw(SliceType::I).unwrap());
        assert_eq!(24, i16.to_raw(SliceType::P).unwrap());
        assert_eq!(42, i16.to_raw(SliceType::B).unwrap());
        assert_eq!(20, i16.to_raw(SliceType::SI).unwrap());
        assert_eq!(i16, MbType::from_raw(SliceType::B, 42).unwrap());

        assert_eq!(
            MbType::B8x16(Pred::L1, Pred::Bi),
            MbType::from_raw(SliceType::B, 15).unwrap()
        );
        assert_eq!(
            MbType::B16x8(Pred::Bi, Pred::Bi),
            MbType::from_raw(SliceType::B, 20).unwrap()
        );
        assert_eq!(MbType::IPcm, MbType::from_raw(SliceType::P, 30).unwrap());
        assert_eq!(MbType::Si, MbType::from_raw(SliceType::SI, 0).unwrap());
    }

    #[test]
    fn mb_type_numbering_is_a_bijection() {
        for (slice_type, count) in [
            (SliceType::I, 26),
            (SliceType::SI, 27),
            (SliceType::P, 31),
            (SliceType::B, 49),
        ] {
            for raw in 0..count {
                let mb_type = MbType::from_raw(slice_type, raw).unwrap();
                assert_eq!(raw, mb_type.to_raw(slice_type).unwrap());
            }

            assert_eq!(
                Error::OutOfRange("mb_type above its table"),
                MbType::from_raw(slice_type, count).unwrap_err()
            );
        }
    }

    #[test]
    fn mb_type_slice_checks() {
        assert!(MbType::PSkip.to_raw(SliceType::P).is_err());
        assert!(MbType::P16x16.to_raw(SliceType::B).is_err());
        assert!(MbType::Si.to_raw(SliceType::I).is_err());
        assert!(MbType::I16x16 {
            pred_mode: 4,
            cbp_chroma: 0,
            cbp_luma_all: false
        }
        .to_raw(SliceType::I)
        .is_err());
    }

    #[test]
    fn sub_mb_type_numbering() {
        for raw in 0..13 {
            let sub = SubMbType::from_raw(SliceType::B, raw).unwrap();
            assert_eq!(raw, sub.to_raw(SliceType::B).unwrap());
        }
        assert_eq!(SubMbType::B4x8(Pred::L1), SubMbType::from_raw(SliceType::B, 7).unwrap());
        assert_eq!(SubMbType::P4x4, SubMbType::from_raw(SliceType::P, 3).unwrap());
        assert!(SubMbType::from_raw(SliceType::P, 4).is_err());
        assert!(SubMbType::P8x4.to_raw(SliceType::B).is_err());
        assert!(SubMbType::from_raw(SliceType::I, 0).is_err());
    }
}
