//! PNG dumps for inspecting an export.
//!
//! - `encode_vram_png`: the whole canvas, every word shown as a 5-5-5 color
//!   (packed index words of 4/8-bit textures show up as noise, as on hardware
//!   VRAM viewers)
//! - `encode_texture_png`: one texture in source orientation; paletted
//!   textures are written as indexed PNGs with their CLUT as the PNG palette
//! - `dump_texture_words` / `dump_clut_words`: raw little-endian VRAM words
//!   of one texture and of its CLUT, as they are uploaded

use crate::color::VramPixel;
use crate::texture::IndexedTexture;
use crate::vram::{VramCanvas, VRAM_HEIGHT, VRAM_WIDTH};

pub fn encode_vram_png(canvas: &VramCanvas) -> Result<Vec<u8>, png::EncodingError> {
    let rgb: Vec<u8> = canvas
        .as_slice()
        .iter()
        .flat_map(|&w| VramPixel::unpack(w).to_rgb8())
        .collect();
    encode_rgb(VRAM_WIDTH as u32, VRAM_HEIGHT as u32, &rgb)
}

pub fn encode_texture_png(texture: &IndexedTexture) -> Result<Vec<u8>, png::EncodingError> {
    let (width, height) = (texture.width() as u32, texture.height() as u32);

    match (texture.indices(), texture.palette()) {
        (Some(indices), Some(palette)) if !palette.is_empty() => {
            let mut output = Vec::new();
            {
                let mut encoder = png::Encoder::new(&mut output, width, height);
                encoder.set_color(png::ColorType::Indexed);
                encoder.set_depth(png::BitDepth::Eight);
                let flat_palette: Vec<u8> = palette.iter().flat_map(|p| p.to_rgb8()).collect();
                encoder.set_palette(flat_palette);
                let mut writer = encoder.write_header()?;
                writer.write_image_data(indices)?;
            }
            Ok(output)
        }
        _ => {
            let rgb: Vec<u8> = texture.decode_rgb().into_iter().flatten().collect();
            encode_rgb(width, height, &rgb)
        }
    }
}

/// Packed texture words, bottom row first, 2 bytes LE each.
pub fn dump_texture_words(texture: &IndexedTexture) -> Vec<u8> {
    words_le(texture.words())
}

/// Packed CLUT entries, one word per palette entry. `None` for 16-bit textures.
pub fn dump_clut_words(texture: &IndexedTexture) -> Option<Vec<u8>> {
    let palette = texture.palette()?;
    let words: Vec<u16> = palette.iter().map(VramPixel::pack).collect();
    Some(words_le(&words))
}

fn words_le(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

fn encode_rgb(width: u32, height: u32, rgb: &[u8]) -> Result<Vec<u8>, png::EncodingError> {
    let mut output = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut output, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgb)?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::BitDepth;

    fn decode(bytes: &[u8]) -> (png::OutputInfo, Vec<u8>) {
        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info, buf)
    }

    #[test]
    fn test_vram_png_dimensions() {
        let mut canvas = VramCanvas::new();
        canvas.set(0, 0, VramPixel::new(31, 0, 0, false).pack());
        let (info, data) = decode(&encode_vram_png(&canvas).unwrap());
        assert_eq!((info.width, info.height), (1024, 512));
        assert_eq!(&data[0..6], &[255, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_indexed_texture_png() {
        let palette = vec![VramPixel::new(31, 31, 31, false), VramPixel::new(0, 0, 31, false)];
        let texture =
            IndexedTexture::from_indices(2, 2, BitDepth::Four, vec![0, 1, 1, 0], palette).unwrap();
        let bytes = encode_texture_png(&texture).unwrap();
        let decoder = png::Decoder::new(std::io::Cursor::new(&bytes[..]));
        let mut reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().color_type, png::ColorType::Indexed);
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (2, 2));
    }

    #[test]
    fn test_texture_word_dump() {
        let palette = vec![VramPixel::new(31, 0, 0, false), VramPixel::new(0, 0, 31, true)];
        // rows: [1, 0, 0, 0] on top, [0, 1, 1, 1] below
        let texture =
            IndexedTexture::from_indices(4, 2, BitDepth::Four, vec![1, 0, 0, 0, 0, 1, 1, 1], palette).unwrap();

        // bottom row first: 0x1110, then 0x0001
        assert_eq!(dump_texture_words(&texture), vec![0x10, 0x11, 0x01, 0x00]);
        assert_eq!(dump_clut_words(&texture), Some(vec![0x1F, 0x00, 0x00, 0xFC]));
    }

    #[test]
    fn test_direct_texture_has_no_clut_dump() {
        let image = crate::image::Image::from_rgb(1, 1, &[[1.0, 0.0, 0.0]]).unwrap();
        let texture =
            IndexedTexture::from_image(&image, BitDepth::Sixteen, &crate::quantize::QuantizeOptions::default());
        assert_eq!(dump_texture_words(&texture), vec![0x1F, 0x00]);
        assert_eq!(dump_clut_words(&texture), None);
    }
}
