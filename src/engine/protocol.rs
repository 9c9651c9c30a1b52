//! Typed encode/decode helpers for every coordinator-facing wire message.
//! Row frames encode through [`Row`] itself; everything else lives here.
//! All integers are little-endian and each message type has a fixed size
//! known to both ends, so no tag multiplexing is needed.

use crate::domain::{Cell, Row, TileHit};
use crate::error::SimError;
use crate::transport::Rank;

/// Wire size of a termination report.
pub const REPORT_LEN: usize = 24;

/// Wire size of a termination decision.
pub const DECISION_LEN: usize = 4;

/// Wire size of the partition vector for a grid of `grid_size` rows.
pub const fn partition_len(grid_size: usize) -> usize {
    4 * grid_size
}

/// Wire size of a row assignment for a grid of `grid_size` columns.
pub const fn assignment_len(grid_size: usize) -> usize {
    4 + 4 * grid_size
}

pub fn encode_partition(owners: &[Rank]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(partition_len(owners.len()));
    for &owner in owners {
        buf.extend_from_slice(&(owner as u32).to_le_bytes());
    }
    buf
}

pub fn decode_partition(bytes: &[u8], grid_size: usize) -> Result<Vec<Rank>, SimError> {
    if bytes.len() != partition_len(grid_size) {
        return Err(SimError::MalformedFrame(format!(
            "partition frame is {} bytes, expected {}",
            bytes.len(),
            partition_len(grid_size)
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|word| read_u32(word) as Rank)
        .collect())
}

/// A row handed from the coordinator to its owner: id followed by the bare
/// cells. Unlike a row frame there is no length word; the receiver already
/// knows the grid size.
pub fn encode_assignment(row: &Row) -> Vec<u8> {
    let mut buf = Vec::with_capacity(assignment_len(row.len()));
    buf.extend_from_slice(&row.id.to_le_bytes());
    for &cell in row.cells() {
        buf.extend_from_slice(&cell.code().to_le_bytes());
    }
    buf
}

pub fn decode_assignment(bytes: &[u8], grid_size: usize) -> Result<Row, SimError> {
    if bytes.len() != assignment_len(grid_size) {
        return Err(SimError::MalformedFrame(format!(
            "row assignment is {} bytes, expected {}",
            bytes.len(),
            assignment_len(grid_size)
        )));
    }
    let id = read_u32(&bytes[0..4]);
    let mut cells = Vec::with_capacity(grid_size);
    for word in bytes[4..].chunks_exact(4) {
        cells.push(Cell::from_code(read_u32(word))?);
    }
    Ok(Row::from_cells(id, cells))
}

/// Per-iteration verdict a worker sends the coordinator. For a not-finished
/// report the tile fields are zeroed and ignored by the receiver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Report {
    pub finished: bool,
    pub tile_col: u32,
    pub tile_row: u32,
    pub color: Cell,
    pub ratio: f64,
}

impl Report {
    pub const fn finished(hit: &TileHit) -> Self {
        Self {
            finished: true,
            tile_col: hit.tile_col,
            tile_row: hit.tile_row,
            color: hit.color,
            ratio: hit.ratio,
        }
    }

    pub const fn none() -> Self {
        Self {
            finished: false,
            tile_col: 0,
            tile_row: 0,
            color: Cell::White,
            ratio: 0.0,
        }
    }

    /// Canonical fixed layout: finished flag widened to a u32, the tile
    /// coordinates and color code as u32s, then the ratio as an IEEE-754
    /// double. 24 bytes total.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(REPORT_LEN);
        buf.extend_from_slice(&u32::from(self.finished).to_le_bytes());
        buf.extend_from_slice(&self.tile_col.to_le_bytes());
        buf.extend_from_slice(&self.tile_row.to_le_bytes());
        buf.extend_from_slice(&self.color.code().to_le_bytes());
        buf.extend_from_slice(&self.ratio.to_le_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SimError> {
        if bytes.len() != REPORT_LEN {
            return Err(SimError::MalformedFrame(format!(
                "report is {} bytes, expected {REPORT_LEN}",
                bytes.len()
            )));
        }
        Ok(Self {
            finished: read_u32(&bytes[0..4]) != 0,
            tile_col: read_u32(&bytes[4..8]),
            tile_row: read_u32(&bytes[8..12]),
            color: Cell::from_code(read_u32(&bytes[12..16]))?,
            ratio: f64::from_le_bytes([
                bytes[16], bytes[17], bytes[18], bytes[19], bytes[20], bytes[21], bytes[22],
                bytes[23],
            ]),
        })
    }
}

/// Coordinator's broadcast verdict; nonzero means stop.
pub fn encode_decision(stop: bool) -> Vec<u8> {
    u32::from(stop).to_le_bytes().to_vec()
}

pub fn decode_decision(bytes: &[u8]) -> Result<bool, SimError> {
    if bytes.len() != DECISION_LEN {
        return Err(SimError::MalformedFrame(format!(
            "decision is {} bytes, expected {DECISION_LEN}",
            bytes.len()
        )));
    }
    Ok(read_u32(bytes) != 0)
}

#[inline]
fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
