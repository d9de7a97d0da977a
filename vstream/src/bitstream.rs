//! Bit-level cursor over an elementary stream.

mod cursor;
mod framing;
mod vlc;

pub use cursor::{Bitstream, Direction, StreamFormat};
pub use framing::AlignMode;
pub use vlc::{VlcCode, VlcTable};
