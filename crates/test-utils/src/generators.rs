//! Generators for synthetic land-cover grids.
//!
//! Every generator is deterministic so tests can compute expected counts
//! with [`count_code`].

/// No-data code used by the land-cover products.
pub const NO_DATA: u8 = 255;

/// Creates a grid whose columns cycle through `codes`.
///
/// # Example
///
/// ```
/// use test_utils::striped_grid;
///
/// let grid = striped_grid(4, 2, &[10, 12]);
/// assert_eq!(grid, vec![10, 12, 10, 12, 10, 12, 10, 12]);
/// ```
pub fn striped_grid(width: usize, height: usize, codes: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(codes[col % codes.len()]);
        }
    }
    data
}

/// Creates a grid split into four quadrants (NW, NE, SW, SE).
pub fn quadrant_grid(width: usize, height: usize, codes: [u8; 4]) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let east = col >= width / 2;
            let south = row >= height / 2;
            let idx = (south as usize) * 2 + east as usize;
            data.push(codes[idx]);
        }
    }
    data
}

/// Creates a pseudo-random grid of MODIS IGBP codes (1-17) with roughly
/// one cell in twenty set to no-data.
pub fn scattered_grid(width: usize, height: usize, seed: u64) -> Vec<u8> {
    // Numerical Recipes LCG
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    (0..width * height)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let r = (state >> 33) as u32;
            if r % 20 == 0 {
                NO_DATA
            } else {
                (r % 17) as u8 + 1
            }
        })
        .collect()
}

/// Number of cells equal to `code`.
pub fn count_code(data: &[u8], code: u8) -> u64 {
    data.iter().filter(|&&c| c == code).count() as u64
}
