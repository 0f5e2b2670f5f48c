//! PNG encoding for RGBA image data.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: Used when image has ≤256 unique colors.
//!   Category masks and most charts land here.
//! - **RGBA PNG (color type 6)**: Fallback for images with >256 colors
//!   (anti-aliased figure text and lines).
//!
//! Every image may carry `tEXt` chunks; the renderers store the artifact
//! title under the `Title` keyword.

use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Write;

use crate::error::RenderError;

/// PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Keyword used for artifact titles.
pub const TITLE_KEYWORD: &str = "Title";

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096; // 64x64 or larger

type Palette = Vec<(u8, u8, u8, u8)>;

/// Encode RGBA pixels, picking indexed or truecolor output automatically.
///
/// `text` entries become `tEXt` chunks. Keywords must be 1-79 Latin-1
/// characters; values are written as-is with non-Latin-1 characters
/// replaced by `?`.
pub fn encode_rgba(
    pixels: &[u8],
    width: usize,
    height: usize,
    text: &[(&str, &str)],
) -> Result<Vec<u8>, RenderError> {
    if width == 0 || height == 0 || pixels.len() != width * height * 4 {
        return Err(RenderError::Png(format!(
            "{} bytes cannot form a {}x{} RGBA image",
            pixels.len(),
            width,
            height
        )));
    }

    let palette = if width * height >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette_sequential(pixels)
    };

    let mut png = Vec::with_capacity(pixels.len() / 4 + 1024);
    png.extend_from_slice(&PNG_SIGNATURE);

    let color_type = if palette.is_some() { 3 } else { 6 };
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr.push(8); // bit depth
    ihdr.push(color_type);
    ihdr.push(0); // compression method
    ihdr.push(0); // filter method
    ihdr.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr);

    for (keyword, value) in text {
        write_chunk(&mut png, b"tEXt", &text_chunk_data(keyword, value)?);
    }

    let idat = match palette {
        Some((palette, indices)) => {
            let plte: Vec<u8> = palette.iter().flat_map(|&(r, g, b, _)| [r, g, b]).collect();
            write_chunk(&mut png, b"PLTE", &plte);
            if palette.iter().any(|&(_, _, _, a)| a < 255) {
                let trns: Vec<u8> = palette.iter().map(|&(_, _, _, a)| a).collect();
                write_chunk(&mut png, b"tRNS", &trns);
            }
            deflate_scanlines(&indices, width, height, 1)
        }
        None => deflate_scanlines(pixels, width, height, 4),
    }
    .map_err(|e| RenderError::Png(format!("IDAT compression failed: {}", e)))?;
    write_chunk(&mut png, b"IDAT", &idat);

    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Read a `tEXt` value back out of an encoded PNG.
pub fn read_text_chunk(png: &[u8], keyword: &str) -> Option<String> {
    if png.len() < PNG_SIGNATURE.len() || png[..8] != PNG_SIGNATURE {
        return None;
    }
    let mut pos = PNG_SIGNATURE.len();
    while pos + 8 <= png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().ok()?) as usize;
        let kind = &png[pos + 4..pos + 8];
        let data = png.get(pos + 8..pos + 8 + len)?;
        if kind == b"tEXt" {
            if let Some(sep) = data.iter().position(|&b| b == 0) {
                if &data[..sep] == keyword.as_bytes() {
                    return Some(data[sep + 1..].iter().map(|&b| b as char).collect());
                }
            }
        }
        if kind == b"IEND" {
            break;
        }
        pos += 12 + len;
    }
    None
}

fn text_chunk_data(keyword: &str, value: &str) -> Result<Vec<u8>, RenderError> {
    if keyword.is_empty()
        || keyword.len() > 79
        || !keyword.bytes().all(|b| (32..=126).contains(&b))
    {
        return Err(RenderError::Png(format!("invalid tEXt keyword: {:?}", keyword)));
    }
    let mut data = Vec::with_capacity(keyword.len() + 1 + value.len());
    data.extend_from_slice(keyword.as_bytes());
    data.push(0);
    data.extend(value.chars().map(|c| {
        let code = c as u32;
        if code < 256 && code != 0 {
            code as u8
        } else {
            b'?'
        }
    }));
    Ok(data)
}

/// Pack RGBA bytes into a u32 for faster hashing and comparison
#[inline(always)]
fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}

#[inline(always)]
fn unpack_color(packed: u32) -> (u8, u8, u8, u8) {
    (
        packed as u8,
        (packed >> 8) as u8,
        (packed >> 16) as u8,
        (packed >> 24) as u8,
    )
}

/// Sequential palette extraction for small images.
fn extract_palette_sequential(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices: Vec<u8> = Vec::with_capacity(pixels.len() / 4);

    for chunk in pixels.chunks_exact(4) {
        let packed = pack_color(chunk[0], chunk[1], chunk[2], chunk[3]);
        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push((chunk[0], chunk[1], chunk[2], chunk[3]));
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Parallel palette extraction for larger images.
///
/// Collects unique colours per chunk, merges them, then maps pixels to
/// indices in a second parallel pass.
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let chunk_pixels = (pixels.len() / 4 / rayon::current_num_threads()).max(256);

    let unique_colors: Vec<u32> = pixels
        .par_chunks(chunk_pixels * 4)
        .flat_map_iter(|chunk| {
            let mut local: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            for pixel in chunk.chunks_exact(4) {
                local.insert(pack_color(pixel[0], pixel[1], pixel[2], pixel[3]), ());
                // Too many colours already; the merge below will bail out
                if local.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local.into_keys()
        })
        .collect();

    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    for packed in unique_colors {
        if lookup.contains_key(&packed) {
            continue;
        }
        if palette.len() >= MAX_PALETTE_SIZE {
            return None;
        }
        lookup.insert(packed, palette.len() as u8);
        palette.push(unpack_color(packed));
    }

    let indices: Vec<u8> = pixels
        .par_chunks_exact(4)
        .map(|p| lookup.get(&pack_color(p[0], p[1], p[2], p[3])).copied().unwrap_or(0))
        .collect();

    Some((palette, indices))
}

/// Prefix each scanline with filter type 0 and deflate.
fn deflate_scanlines(
    data: &[u8],
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
) -> std::io::Result<Vec<u8>> {
    let stride = width * bytes_per_pixel;
    let mut uncompressed = Vec::with_capacity(height * (1 + stride));
    for row in data.chunks_exact(stride).take(height) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed)?;
    encoder.finish()
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_palette_simple() {
        // red, green, blue, red
        let pixels = [
            255, 0, 0, 255, //
            0, 255, 0, 255, //
            0, 0, 255, 255, //
            255, 0, 0, 255,
        ];
        let (palette, indices) = extract_palette_sequential(&pixels).unwrap();
        assert_eq!(palette.len(), 3);
        assert_eq!(indices[0], indices[3]);
    }

    #[test]
    fn test_parallel_matches_sequential_colours() {
        let mut pixels = Vec::with_capacity(128 * 128 * 4);
        for y in 0..128u32 {
            for x in 0..128u32 {
                let c = ((x / 16 + y / 16) % 5) as u8;
                pixels.extend_from_slice(&[c * 40, 200 - c * 30, 90, 255]);
            }
        }
        let (palette, indices) = extract_palette_parallel(&pixels).unwrap();
        assert_eq!(palette.len(), 5);
        for (i, p) in pixels.chunks_exact(4).enumerate() {
            let (r, g, b, a) = palette[indices[i] as usize];
            assert_eq!([r, g, b, a], [p[0], p[1], p[2], p[3]]);
        }
    }

    #[test]
    fn test_too_many_colours_falls_back_to_rgba() {
        let mut pixels = Vec::with_capacity(300 * 4);
        for i in 0..300u32 {
            pixels.extend_from_slice(&[(i % 256) as u8, (i / 2) as u8, (i / 3) as u8, 255]);
        }
        assert!(extract_palette_sequential(&pixels).is_none());
        let png = encode_rgba(&pixels, 300, 1, &[]).unwrap();
        // colour type byte in IHDR
        assert_eq!(png[25], 6);
    }

    #[test]
    fn test_title_chunk_roundtrip() {
        let pixels = [0u8, 0, 0, 0, 255, 255, 255, 255];
        let png = encode_rgba(&pixels, 2, 1, &[(TITLE_KEYWORD, "croplands 2015")]).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
        assert_eq!(png[25], 3);
        assert_eq!(
            read_text_chunk(&png, TITLE_KEYWORD).as_deref(),
            Some("croplands 2015")
        );
        assert_eq!(read_text_chunk(&png, "Author"), None);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(encode_rgba(&[0; 7], 1, 2, &[]).is_err());
        assert!(encode_rgba(&[0; 4], 1, 1, &[("", "x")]).is_err());
    }
}
