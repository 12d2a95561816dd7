use thiserror::Error;

/// Precondition violations detected before a batched call computes anything.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Shape mismatch for '{tensor}': expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        tensor: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Block type {block_type} at pose {pose}, block {block} is outside [-1, {n_types})")]
    BlockTypeOutOfRange {
        pose: usize,
        block: usize,
        block_type: i32,
        n_types: usize,
    },

    #[error(
        "Block {block} of pose {pose} spans atoms [{offset}, {end}) beyond the {max_n_atoms} atom slots"
    )]
    AtomRangeOverflow {
        pose: usize,
        block: usize,
        offset: i32,
        end: i64,
        max_n_atoms: usize,
    },

    #[error("Connection {connection} of pose {pose}, block {block} points at invalid block {partner}")]
    ConnectionOutOfRange {
        pose: usize,
        block: usize,
        connection: usize,
        partner: i32,
    },

    #[error("Block type {block_type} is inconsistent: {reason}")]
    InvalidBlockType { block_type: usize, reason: String },

    #[error(
        "Tile {tile} of block type {block_type} holds {n_polar} polar and {n_occluder} occluder atoms, more than {tile_size}"
    )]
    TileOverflow {
        block_type: usize,
        tile: usize,
        n_polar: i32,
        n_occluder: i32,
        tile_size: usize,
    },
}
