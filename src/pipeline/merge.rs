//! Lossless page merging: ordered page images → one paginated PDF.
//!
//! ## Why raw pixels + Flate, not JPEG?
//!
//! The merged document is an evidentiary artifact. Each page's pixel data is
//! embedded as an uncompressed image XObject and the whole document is
//! flate-compressed on save — Flate is lossless, so the PDF reproduces the
//! scan bit-for-bit. Re-encoding through JPEG (chroma subsampling, DCT
//! quantisation) would alter pixel values and is never applied here.
//!
//! The merge is append-only and order-preserving: one PDF page per input
//! image, page geometry equal to the image's pixel dimensions, no
//! re-ordering, de-duplication, or page-merging heuristics.

use crate::error::MigrateError;
use crate::pipeline::extract::PageImage;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;
use tracing::debug;

/// Merge `pages` in order into a single PDF, returned as bytes.
///
/// # Errors
/// * [`MigrateError::UnsupportedImageFormat`] — a page payload cannot be
///   decoded as a raster image
/// * [`MigrateError::Merge`] — the PDF writer failed
pub fn merge(pages: &[PageImage]) -> Result<Vec<u8>, MigrateError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for (i, page) in pages.iter().enumerate() {
        let img = image::load_from_memory(&page.bytes).map_err(|e| {
            MigrateError::UnsupportedImageFormat {
                page: i + 1,
                name: page.name.clone(),
                detail: e.to_string(),
            }
        })?;

        let page_id = append_image_page(&mut doc, pages_id, &img)?;
        debug!(
            "Merged page {} ('{}') at {}x{} px",
            i + 1,
            page.name,
            img.width(),
            img.height()
        );
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    // Flate all streams (image pixels included) — lossless.
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut Cursor::new(&mut buf))
        .map_err(MigrateError::merge)?;
    Ok(buf)
}

/// Append one page sized exactly to the image's pixel dimensions, drawing
/// the image across the full page.
fn append_image_page(
    doc: &mut Document,
    pages_id: lopdf::ObjectId,
    img: &DynamicImage,
) -> Result<lopdf::ObjectId, MigrateError> {
    let (width, height) = (img.width() as i64, img.height() as i64);
    let (color_space, samples) = raw_samples(img);

    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
        },
        samples,
    );
    let image_id = doc.add_object(image_stream);

    // Scale the unit image square to the page box, then draw.
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(height),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().map_err(MigrateError::merge)?,
    ));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width),
            Object::Integer(height),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    }))
}

/// Raw 8-bit samples plus the matching PDF colour space.
///
/// Grayscale scans stay single-channel; everything else is widened to RGB.
/// Alpha channels are discarded — scanned pages carry no transparency.
fn raw_samples(img: &DynamicImage) -> (&'static str, Vec<u8>) {
    match img {
        DynamicImage::ImageLuma8(g) => ("DeviceGray", g.as_raw().clone()),
        other => ("DeviceRGB", other.to_rgb8().into_raw()),
    }
}
