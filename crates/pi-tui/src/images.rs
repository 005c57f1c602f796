//! Kitty graphics protocol support.
//!
//! Covers what the engine itself needs: the cell pixel-size cache fed
//! by the `CSI 16 t` query response, random image identifiers, image
//! dimension sniffing for common formats, and the APC transmit /
//! placement sequences. Widgets build on these to show inline images.

use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::Rng;

/// Cell size in pixels, packed `width << 32 | height`; 0 means unknown.
/// Written only from the event thread when the terminal reports it.
static CELL_SIZE: AtomicU64 = AtomicU64::new(0);

/// Record the terminal's cell size in pixels.
pub fn set_cell_size(width_px: u32, height_px: u32) {
    let packed = (u64::from(width_px) << 32) | u64::from(height_px);
    CELL_SIZE.store(packed, Ordering::Relaxed);
}

/// The cached cell size in pixels as `(width, height)`.
pub fn cell_size() -> Option<(u32, u32)> {
    let packed = CELL_SIZE.load(Ordering::Relaxed);
    if packed == 0 {
        return None;
    }
    Some(((packed >> 32) as u32, packed as u32))
}

/// Parse the `CSI 6 ; height ; width t` cell-size report. Returns
/// `(height_px, width_px)`.
pub fn parse_cell_size_report(data: &str) -> Option<(u32, u32)> {
    let body = data.strip_prefix("\x1b[6;")?.strip_suffix('t')?;
    let mut parts = body.split(';');
    let height: u32 = parts.next()?.parse().ok()?;
    let width: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || height == 0 || width == 0 {
        return None;
    }
    Some((height, width))
}

/// Allocate a random, non-zero image identifier.
///
/// Collisions are statistically tolerated: identifiers scope to a
/// short-lived displayed image.
pub fn next_image_id() -> u32 {
    let mut rng = rand::rng();
    loop {
        let id: u32 = rng.random();
        if id != 0 {
            return id;
        }
    }
}

/// Pixel dimensions `(width, height)` sniffed from an image header.
/// Understands PNG, GIF, and JPEG.
pub fn detect_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return png_dimensions(bytes);
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return gif_dimensions(bytes);
    }
    if bytes.starts_with(&[0xff, 0xd8]) {
        return jpeg_dimensions(bytes);
    }
    None
}

fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    // Signature (8) + IHDR length/type (8) + width (4) + height (4).
    if bytes.len() < 24 || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    Some((width, height))
}

fn gif_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 10 {
        return None;
    }
    let width = u16::from_le_bytes([bytes[6], bytes[7]]);
    let height = u16::from_le_bytes([bytes[8], bytes[9]]);
    Some((u32::from(width), u32::from(height)))
}

fn jpeg_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let mut i = 2;
    while i + 9 < bytes.len() {
        if bytes[i] != 0xff {
            return None;
        }
        let marker = bytes[i + 1];
        // Standalone markers without a length field.
        if (0xd0..=0xd9).contains(&marker) {
            i += 2;
            continue;
        }
        let length = usize::from(u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]));
        // SOF0..SOF15 minus DHT/JPG/DAC carry the frame size.
        let is_sof = matches!(marker, 0xc0..=0xcf) && !matches!(marker, 0xc4 | 0xc8 | 0xcc);
        if is_sof {
            let height = u32::from(u16::from_be_bytes([bytes[i + 5], bytes[i + 6]]));
            let width = u32::from(u16::from_be_bytes([bytes[i + 7], bytes[i + 8]]));
            return Some((width, height));
        }
        i += 2 + length;
    }
    None
}

/// Cell footprint for an image of the given pixel size, using the
/// cached cell dimensions. Rounds up so the image is never cropped.
pub fn cells_for_pixels(width_px: u32, height_px: u32) -> Option<(usize, usize)> {
    let (cell_w, cell_h) = cell_size()?;
    if cell_w == 0 || cell_h == 0 {
        return None;
    }
    let cols = width_px.div_ceil(cell_w) as usize;
    let rows = height_px.div_ceil(cell_h) as usize;
    Some((cols, rows))
}

/// Maximum payload bytes per APC chunk, per the Kitty protocol.
const CHUNK_SIZE: usize = 4096;

/// Build the APC sequences that transmit `data` (PNG bytes) under the
/// given image id. The payload is base64 encoded and chunked.
pub fn transmit_sequence(id: u32, data: &[u8]) -> String {
    let encoded = BASE64.encode(data);
    let mut out = String::with_capacity(encoded.len() + 64);
    let chunks: Vec<&str> = encoded
        .as_bytes()
        .chunks(CHUNK_SIZE)
        .map(|c| std::str::from_utf8(c).unwrap_or(""))
        .collect();
    let total = chunks.len();
    for (index, chunk) in chunks.iter().enumerate() {
        let more = usize::from(index + 1 < total);
        if index == 0 {
            out.push_str(&format!("\x1b_Ga=T,f=100,i={id},q=1,m={more};{chunk}\x1b\\"));
        } else {
            out.push_str(&format!("\x1b_Gm={more};{chunk}\x1b\\"));
        }
    }
    out
}

/// Build the APC sequence that places a transmitted image at the
/// cursor, scaled to a cell rectangle.
pub fn placement_sequence(id: u32, cols: usize, rows: usize) -> String {
    format!("\x1b_Ga=p,i={id},c={cols},r={rows},q=1\x1b\\")
}

/// Build the APC sequence that deletes an image by id.
pub fn delete_sequence(id: u32) -> String {
    format!("\x1b_Ga=d,d=i,i={id},q=1\x1b\\")
}
