//! PNG encoding and decoding of canvases.

use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use walle_runtime::Canvas;
use walle_source::Error;

/// A decoded image as a row-major RGBA raster.
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

/// Decodes PNG `bytes` of any color type into 8-bit RGBA.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, Error> {
    let decode_err = |err: png::DecodingError| Error::import(format!("Cannot decode image: {}", err));

    let mut decoder = Decoder::new(bytes);
    // palettes and low bit depths to 8-bit channels
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(decode_err)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(decode_err)?;
    let buf = &buf[..info.buffer_size()];

    let pixels = match info.color_type {
        ColorType::Rgba => buf.to_vec(),
        ColorType::Rgb => buf
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect(),
        ColorType::Grayscale => buf.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|px| [px[0], px[0], px[0], px[1]])
            .collect(),
        ColorType::Indexed => {
            return Err(Error::import("Cannot decode image: unexpanded palette."));
        }
    };

    Ok(RgbaImage {
        width: info.width as usize,
        height: info.height as usize,
        pixels,
    })
}

/// Decodes a background image and scales it to `width` x `height`.
pub fn decode_background(bytes: &[u8], width: usize, height: usize) -> Result<Canvas, Error> {
    let image = decode_png(bytes)?;
    Canvas::from_rgba(&image.pixels, image.width, image.height, width, height)
}

/// Encodes `canvas` as an 8-bit RGBA PNG.
pub fn encode_png(canvas: &Canvas) -> Result<Vec<u8>, Error> {
    let encode_err = |err: png::EncodingError| Error::import(format!("Cannot encode image: {}", err));

    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out, canvas.width() as u32, canvas.height() as u32);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(encode_err)?;
    writer.write_image_data(&canvas.to_rgba()).map_err(encode_err)?;
    writer.finish().map_err(encode_err)?;
    Ok(out)
}
