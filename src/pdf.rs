//! Single-page PDF output for a captured bitmap.
//!
//! No layout engine: the page is exactly as large as the bitmap (one PDF
//! point per pixel) and the bitmap is drawn once, filling it.
//!
//! ```text
//! Catalog ─▶ Pages ─▶ Page ─┬─ Contents: q W 0 0 H 0 0 cm /Im0 Do Q
//!                           └─ Resources/XObject/Im0: W×H DeviceRGB, FlateDecode
//! ```
//!
//! Transparent pixels are flattened onto white before embedding, so the
//! page looks like the on-screen composite.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{DynamicImage, RgbImage};
use lopdf::{Document, Object, Stream, dictionary};
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Cannot embed an empty {0}x{1} bitmap")]
    EmptyBitmap(u32, u32),
    #[error("Failed to compress image data: {0}")]
    Compress(#[from] std::io::Error),
    #[error("Failed to write PDF: {0}")]
    Save(String),
}

const IMAGE_NAME: &str = "Im0";

/// Composite RGBA onto an opaque white background.
fn flatten_on_white(bitmap: &DynamicImage) -> RgbImage {
    let rgba = bitmap.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let over_white = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        image::Rgb([over_white(r), over_white(g), over_white(b)])
    })
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Content stream operators that draw the named image over the full page.
fn draw_operators(width: u32, height: u32) -> Vec<u8> {
    format!("q\n{width} 0 0 {height} 0 0 cm\n/{IMAGE_NAME} Do\nQ\n").into_bytes()
}

/// Build a one-page PDF sized to `bitmap` and return its bytes.
pub fn single_page_pdf(bitmap: &DynamicImage) -> Result<Vec<u8>, PdfError> {
    let (width, height) = (bitmap.width(), bitmap.height());
    if width == 0 || height == 0 {
        return Err(PdfError::EmptyBitmap(width, height));
    }

    let rgb = flatten_on_white(bitmap);
    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(rgb.as_raw())?,
    );

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(image_stream);
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        draw_operators(width, height),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_NAME => image_id },
        },
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => 1,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width as i64),
            Object::Integer(height as i64),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PdfError::Save(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn media_box(doc: &Document) -> Vec<i64> {
        doc.objects
            .values()
            .filter_map(|obj| obj.as_dict().ok())
            .find_map(|dict| dict.get(b"MediaBox").ok())
            .and_then(|obj| obj.as_array().ok())
            .map(|arr| arr.iter().filter_map(|o| o.as_i64().ok()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn produces_single_page_sized_to_bitmap() {
        let bitmap = DynamicImage::new_rgba8(280, 140);
        let bytes = single_page_pdf(&bitmap).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert_eq!(media_box(&doc), vec![0, 0, 280, 140]);
    }

    #[test]
    fn embeds_flattened_rgb_pixels() {
        let mut rgba = image::RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 255]));
        rgba.put_pixel(1, 0, image::Rgba([0, 0, 0, 0]));
        let bytes = single_page_pdf(&DynamicImage::ImageRgba8(rgba)).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let stream = doc
            .objects
            .values()
            .filter_map(|obj| obj.as_stream().ok())
            .find(|s| s.dict.get(b"Subtype").and_then(|o| o.as_name()).ok() == Some(&b"Image"[..]))
            .expect("image XObject");

        let mut raw = Vec::new();
        ZlibDecoder::new(&stream.content[..])
            .read_to_end(&mut raw)
            .unwrap();
        // Opaque black stays black, fully transparent becomes white
        assert_eq!(raw, vec![0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn draw_operators_fill_page() {
        let ops = String::from_utf8(draw_operators(256, 128)).unwrap();
        assert_eq!(ops, "q\n256 0 0 128 0 0 cm\n/Im0 Do\nQ\n");
    }

    #[test]
    fn empty_bitmap_is_rejected() {
        let result = single_page_pdf(&DynamicImage::new_rgb8(0, 10));
        assert!(matches!(result, Err(PdfError::EmptyBitmap(0, 10))));
    }
}
