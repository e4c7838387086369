//! Minimal PNG writer for overlay masks.
//!
//! Overlays only ever hold a handful of colors, so images are written as
//! indexed PNG (color type 3) with a `tRNS` chunk carrying per-entry alpha.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::RenderError;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Palette entry as RGBA.
pub type Rgba = (u8, u8, u8, u8);

/// Encode an indexed image, one palette index per pixel, rows top-down.
pub fn encode_indexed(
    width: usize,
    height: usize,
    palette: &[Rgba],
    indices: &[u8],
) -> Result<Vec<u8>, RenderError> {
    if width == 0 || height == 0 || indices.len() != width * height {
        return Err(RenderError::InvalidDimensions {
            width,
            height,
            len: indices.len(),
        });
    }
    if palette.len() > 256 {
        return Err(RenderError::PaletteTooLarge(palette.len()));
    }

    let mut png = Vec::with_capacity(64 + indices.len() / 4);
    png.extend_from_slice(&SIGNATURE);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    // bit depth 8, color type 3 (indexed), deflate, adaptive filter, no interlace
    ihdr.extend_from_slice(&[8, 3, 0, 0, 0]);
    write_chunk(&mut png, b"IHDR", &ihdr);

    let plte: Vec<u8> = palette.iter().flat_map(|&(r, g, b, _)| [r, g, b]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|&(_, _, _, a)| a < 255) {
        let trns: Vec<u8> = palette.iter().map(|&(_, _, _, a)| a).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    write_chunk(&mut png, b"IDAT", &deflate_rows(indices, width)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Encode a boolean mask: `false` is fully transparent, `true` is `color`.
pub fn encode_mask(
    width: usize,
    height: usize,
    mask: &[bool],
    color: Rgba,
) -> Result<Vec<u8>, RenderError> {
    let indices: Vec<u8> = mask.iter().map(|&on| on as u8).collect();
    encode_indexed(width, height, &[(0, 0, 0, 0), color], &indices)
}

/// Prefix each scanline with filter type 0 and zlib-compress.
fn deflate_rows(data: &[u8], row_len: usize) -> Result<Vec<u8>, RenderError> {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(data.len() / 8),
        Compression::fast(),
    );
    for row in data.chunks_exact(row_len) {
        encoder.write_all(&[0])?;
        encoder.write_all(row)?;
    }
    Ok(encoder.finish()?)
}

fn write_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    let crc_start = png.len();
    png.extend_from_slice(kind);
    png.extend_from_slice(data);
    let crc = crc32fast::hash(&png[crc_start..]);
    png.extend_from_slice(&crc.to_be_bytes());
}
