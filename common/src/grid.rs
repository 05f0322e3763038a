//! Linear-index grid math shared by the board engine and client rendering.
//!
//! Tiles are addressed by a flat index `i = row * width + col`. Neighborhood
//! iteration never wraps across row or column edges: a tile on the right edge
//! does not see the leftmost column of the next row.

const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Splits a flat tile index into `(row, col)`.
pub fn index_to_coord(index: usize, width: usize) -> (usize, usize) {
    (index / width, index % width)
}

/// Joins `(row, col)` back into a flat tile index.
pub fn coord_to_index(row: usize, col: usize, width: usize) -> usize {
    row * width + col
}

pub fn in_bounds(row: usize, col: usize, width: usize, height: usize) -> bool {
    row < height && col < width
}

/// The up-to-8 in-bounds neighbors of a tile, excluding the tile itself.
pub fn neighbors(index: usize, width: usize, height: usize) -> impl Iterator<Item = usize> {
    let (row, col) = index_to_coord(index, width);
    NEIGHBOR_OFFSETS.iter().filter_map(move |&(dr, dc)| {
        let r = row as isize + dr;
        let c = col as isize + dc;
        if r >= 0 && c >= 0 && in_bounds(r as usize, c as usize, width, height) {
            Some(coord_to_index(r as usize, c as usize, width))
        } else {
            None
        }
    })
}
