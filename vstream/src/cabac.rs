//! Context-adaptive binary arithmetic coding.

mod context;
mod engine;
mod tables;

pub use context::{ContextBank, ContextInit, ContextState};
pub use engine::Cabac;
pub use tables::{CabacTables, H264_TABLES};
