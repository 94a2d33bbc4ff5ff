use crate::TileKey;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tile name {0}")]
    TileName(PathBuf),

    #[error("tile {key} has {actual} samples, expected {expected}")]
    FormatMismatch {
        key: TileKey,
        expected: usize,
        actual: usize,
    },
}
