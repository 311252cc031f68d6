//! Block-statistics side-files: a flat binary histogram of labels per block, consumed by
//! downstream tools to update per-label spatial indices.
//!
//! Each row is five little-endian 64-bit integers with no framing or length prefix:
//! `(block_z: i64, block_y: i64, block_x: i64, label: u64, count: u64)`. The row count is
//! recovered from file length, since `ROW_BYTES` divides it exactly.

use std::io::{self, Read, Write};

/// Bytes occupied by one row: three `i64` coordinates plus a `u64` label and `u64` count.
pub const ROW_BYTES: usize = 5 * 8;

/// One row of the block-statistics table: how many voxels of `label` occur within the
/// block at `(block_z, block_y, block_x)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStatRow {
    pub block_z: i64,
    pub block_y: i64,
    pub block_x: i64,
    pub label: u64,
    pub count: u64,
}

impl BlockStatRow {
    fn to_bytes(self) -> [u8; ROW_BYTES] {
        let mut out = [0u8; ROW_BYTES];
        out[0..8].copy_from_slice(&self.block_z.to_le_bytes());
        out[8..16].copy_from_slice(&self.block_y.to_le_bytes());
        out[16..24].copy_from_slice(&self.block_x.to_le_bytes());
        out[24..32].copy_from_slice(&self.label.to_le_bytes());
        out[32..40].copy_from_slice(&self.count.to_le_bytes());
        out
    }

    fn from_bytes(buf: &[u8; ROW_BYTES]) -> Self {
        Self {
            block_z: i64::from_le_bytes(buf[0..8].try_into().unwrap()),
            block_y: i64::from_le_bytes(buf[8..16].try_into().unwrap()),
            block_x: i64::from_le_bytes(buf[16..24].try_into().unwrap()),
            label: u64::from_le_bytes(buf[24..32].try_into().unwrap()),
            count: u64::from_le_bytes(buf[32..40].try_into().unwrap()),
        }
    }
}

/// Writes `rows` to `out` as consecutive fixed-width records, in the order given.
pub fn write_block_stats(out: &mut impl Write, rows: &[BlockStatRow]) -> io::Result<()> {
    for row in rows {
        out.write_all(&row.to_bytes())?;
    }
    Ok(())
}

/// Reads every row out of `input` until EOF.
pub fn read_block_stats(input: &mut impl Read) -> io::Result<Vec<BlockStatRow>> {
    let mut buf = Vec::new();
    input.read_to_end(&mut buf)?;
    if buf.len() % ROW_BYTES != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "block-stats file length {} is not a multiple of the row size {ROW_BYTES}",
                buf.len()
            ),
        ));
    }
    let mut rows = Vec::with_capacity(buf.len() / ROW_BYTES);
    for chunk in buf.chunks_exact(ROW_BYTES) {
        let arr: [u8; ROW_BYTES] = chunk.try_into().unwrap();
        rows.push(BlockStatRow::from_bytes(&arr));
    }
    Ok(rows)
}

/// Builds one `BlockStatRow` per distinct label in `brick`, keyed by the brick's logical
/// block coordinates (in `(z, y, x)` order, matching the on-disk column order).
pub fn histogram_for_brick(
    block_coord: (i64, i64, i64),
    labels: impl IntoIterator<Item = u64>,
) -> Vec<BlockStatRow> {
    let mut counts = std::collections::HashMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0u64) += 1;
    }
    let mut rows: Vec<BlockStatRow> = counts
        .into_iter()
        .map(|(label, count)| BlockStatRow {
            block_z: block_coord.0,
            block_y: block_coord.1,
            block_x: block_coord.2,
            label,
            count,
        })
        .collect();
    rows.sort_by_key(|r| r.label);
    rows
}
