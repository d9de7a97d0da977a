//! Pure-rust bit-exact codec for MPEG and H.264 elementary stream syntax.
//!
//! Every primitive in this crate is bidirectional: the same call either
//! writes a value into a [`Bitstream`] being encoded, or reads it back out of
//! one being decoded. A grammar written once against these primitives thus
//! serves as both the encoder and the decoder for that grammar.

#[macro_use]
extern crate bitflags;

#[macro_use]
extern crate lazy_static;

mod bitstream;
mod cabac;
mod error;
pub mod h264;
mod traits;

pub use bitstream::{AlignMode, Bitstream, Direction, StreamFormat, VlcCode, VlcTable};
pub use cabac::{Cabac, CabacTables, ContextBank, ContextInit, ContextState, H264_TABLES};
pub use error::{Error, Result};
pub use traits::BitField;
