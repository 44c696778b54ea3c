//! MCNK map chunks: one 33⅓ yard square of terrain with its sub-chunks.

pub mod chunk;
pub mod header;
pub mod mccv;
pub mod mcly;
pub mod mcnr;

pub use chunk::{McnkChunk, MclqChunk};
pub use header::{McnkFlags, McnkHeader};
pub use mccv::VertexColor;
pub use mcly::{MclyFlags, MclyLayer};
pub use mcnr::{McnrChunk, VertexNormal};

/// Height and normal samples per chunk: a 9×9 outer grid interleaved with
/// an 8×8 inner grid.
pub const VERTICES_PER_CHUNK: usize = 9 * 9 + 8 * 8;

/// Position of sample `(row, column)` in the interleaved MCVT/MCNR order.
///
/// Even rows are outer rows of 9 samples, odd rows inner rows of 8; there
/// are 17 rows in total.
pub fn vertex_index(row: usize, column: usize) -> Option<usize> {
    let width = if row % 2 == 0 { 9 } else { 8 };
    (row < 17 && column < width).then(|| (row / 2) * 17 + (row % 2) * 9 + column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 0 => Some(0); "first outer")]
    #[test_case(0, 8 => Some(8); "last outer")]
    #[test_case(1, 0 => Some(9); "first inner")]
    #[test_case(1, 7 => Some(16); "last inner")]
    #[test_case(16, 8 => Some(144); "last sample")]
    #[test_case(1, 8 => None; "inner rows are one shorter")]
    #[test_case(17, 0 => None; "past the last row")]
    fn interleaved_index(row: usize, column: usize) -> Option<usize> {
        vertex_index(row, column)
    }
}
