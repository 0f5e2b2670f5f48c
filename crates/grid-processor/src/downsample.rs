//! Integer-stride downsampling.
//!
//! Picks every `stride`-th cell in both directions. For category grids this
//! is the only sensible reduction: averaging or taking the maximum of class
//! codes produces codes that were never observed.

/// Smallest stride that brings the larger side down to `max_dim` or less.
///
/// A `max_dim` of 0 disables downsampling.
pub fn stride_for(width: usize, height: usize, max_dim: usize) -> usize {
    let largest = width.max(height);
    if max_dim == 0 || largest <= max_dim {
        1
    } else {
        (largest + max_dim - 1) / max_dim
    }
}

/// Downsample a row-major grid by keeping every `stride`-th cell.
///
/// Output dimensions round up, so the last partial block still contributes
/// its top-left cell.
///
/// # Returns
/// Tuple of (downsampled_data, new_width, new_height)
pub fn downsample_stride<T: Copy>(
    data: &[T],
    width: usize,
    height: usize,
    stride: usize,
) -> (Vec<T>, usize, usize) {
    let stride = stride.max(1);
    let new_width = (width + stride - 1) / stride;
    let new_height = (height + stride - 1) / stride;

    let mut output = Vec::with_capacity(new_width * new_height);
    for row in (0..height).step_by(stride) {
        let line = &data[row * width..(row + 1) * width];
        output.extend(line.iter().step_by(stride).copied());
    }

    (output, new_width, new_height)
}
