//! Signature images captured by the browser as PNG data URIs

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::io::Cursor;

/// Prefix every drawable signature value must carry
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Largest signature accepted, in pixels; checked before any sample buffer
/// is allocated
pub const MAX_SIGNATURE_PIXELS: u64 = 4096 * 4096;

/// Pixel layout of a decoded image, 8 bits per component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
}

impl ColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::Gray => "DeviceGray",
            ColorSpace::Rgb => "DeviceRGB",
        }
    }
}

/// A decoded PNG split into color samples and an optional alpha plane
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureImage {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub color: Vec<u8>,
    /// One byte per pixel; `None` when the image is fully opaque
    pub alpha: Option<Vec<u8>>,
}

/// Return the base64 payload of a PNG data URI, or `None` when the value is
/// not one
pub fn strip_png_data_uri(value: &str) -> Option<&str> {
    value.strip_prefix(PNG_DATA_URI_PREFIX)
}

/// Decode a base64 PNG payload into raw samples
pub fn decode_png_base64(payload: &str) -> Result<SignatureImage, String> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| format!("invalid base64: {}", e))?;
    decode_png(&bytes)
}

/// Decode PNG bytes into raw 8-bit samples
pub fn decode_png(bytes: &[u8]) -> Result<SignatureImage, String> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);

    let mut reader = decoder
        .read_info()
        .map_err(|e| format!("invalid PNG: {}", e))?;

    let (width, height) = {
        let info = reader.info();
        (info.width, info.height)
    };
    let too_large = u64::from(width)
        .checked_mul(u64::from(height))
        .map_or(true, |pixels| pixels > MAX_SIGNATURE_PIXELS);
    if too_large {
        return Err(format!("PNG too large: {}x{}", width, height));
    }

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| format!("invalid PNG: {}", e))?;
    buf.truncate(info.buffer_size());

    if info.width == 0 || info.height == 0 {
        return Err("PNG has no pixels".to_string());
    }
    if info.bit_depth != png::BitDepth::Eight {
        return Err(format!("unsupported PNG bit depth {:?}", info.bit_depth));
    }

    let (color_space, color, alpha) = match info.color_type {
        png::ColorType::Grayscale => (ColorSpace::Gray, buf, None),
        png::ColorType::Rgb => (ColorSpace::Rgb, buf, None),
        png::ColorType::GrayscaleAlpha => {
            let (color, alpha) = split_alpha(&buf, 1);
            (ColorSpace::Gray, color, Some(alpha))
        }
        png::ColorType::Rgba => {
            let (color, alpha) = split_alpha(&buf, 3);
            (ColorSpace::Rgb, color, Some(alpha))
        }
        png::ColorType::Indexed => {
            return Err("palette PNG was not expanded".to_string());
        }
    };

    // Opaque alpha planes add nothing but bytes
    let alpha = alpha.filter(|a| a.iter().any(|&v| v != u8::MAX));

    Ok(SignatureImage {
        width: info.width,
        height: info.height,
        color_space,
        color,
        alpha,
    })
}

fn split_alpha(samples: &[u8], color_components: usize) -> (Vec<u8>, Vec<u8>) {
    let stride = color_components + 1;
    let pixels = samples.len() / stride;
    let mut color = Vec::with_capacity(pixels * color_components);
    let mut alpha = Vec::with_capacity(pixels);
    for px in samples.chunks_exact(stride) {
        color.extend_from_slice(&px[..color_components]);
        alpha.push(px[color_components]);
    }
    (color, alpha)
}
