//! PDF serialisation with lopdf.
//!
//! Fonts are the standard Type1 faces under `WinAnsiEncoding`, so nothing is
//! embedded. Chart PNGs are decoded to raw RGB (alpha composited over white)
//! and written as image XObjects. No timestamps or ids are written, which
//! keeps the output byte-stable for identical input.

use std::io::Cursor;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream, StringFormat};

use crate::core::error::ReportError;

use super::fonts::{FontWeight, Fonts};
use super::layout::{DrawOp, Page, PageGeometry};
use super::text::TextPolicy;

/// A decoded chart ready to embed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Packed 8-bit RGB, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
}

impl ImageData {
    /// Pixel size from the PNG header without decoding the image data.
    pub fn dimensions(png_bytes: &[u8]) -> Result<(u32, u32), ReportError> {
        let reader = png::Decoder::new(Cursor::new(png_bytes)).read_info()?;
        let info = reader.info();
        Ok((info.width, info.height))
    }

    pub fn decode(png_bytes: &[u8]) -> Result<Self, ReportError> {
        let mut decoder = png::Decoder::new(Cursor::new(png_bytes));
        decoder.set_transformations(png::Transformations::normalize_to_color8());
        let mut reader = decoder.read_info()?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut buf)?;
        let data = &buf[..frame.buffer_size()];

        let pixels = frame.width as usize * frame.height as usize;
        let mut rgb = Vec::with_capacity(pixels * 3);
        match frame.color_type {
            png::ColorType::Rgb => rgb.extend_from_slice(data),
            png::ColorType::Rgba => {
                for px in data.chunks_exact(4) {
                    rgb.extend_from_slice(&[over_white(px[0], px[3]), over_white(px[1], px[3]), over_white(px[2], px[3])]);
                }
            }
            png::ColorType::Grayscale => {
                for &g in data {
                    rgb.extend_from_slice(&[g, g, g]);
                }
            }
            png::ColorType::GrayscaleAlpha => {
                for px in data.chunks_exact(2) {
                    let g = over_white(px[0], px[1]);
                    rgb.extend_from_slice(&[g, g, g]);
                }
            }
            png::ColorType::Indexed => {
                return Err(ReportError::Compose("indexed PNG was not expanded".to_string()));
            }
        }

        if rgb.len() != pixels * 3 {
            return Err(ReportError::Compose(format!(
                "decoded image has {} bytes, expected {}",
                rgb.len(),
                pixels * 3
            )));
        }

        Ok(Self {
            width: frame.width,
            height: frame.height,
            rgb,
        })
    }
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let (c, a) = (u32::from(channel), u32::from(alpha));
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

const FACES: [(FontWeight, &str); 3] = [
    (FontWeight::Regular, "F1"),
    (FontWeight::Bold, "F2"),
    (FontWeight::Italic, "F3"),
];

fn font_key(weight: FontWeight) -> &'static str {
    FACES
        .iter()
        .find(|(face, _)| *face == weight)
        .map(|(_, key)| *key)
        .unwrap_or("F1")
}

pub(crate) struct PdfWriter<'a> {
    pub geometry: PageGeometry,
    pub fonts: Fonts,
    pub policy: &'a TextPolicy,
}

impl PdfWriter<'_> {
    pub fn write(&self, title: &str, pages: &[Page], images: &[ImageData]) -> Result<Vec<u8>, ReportError> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut font_dict = Dictionary::new();
        for (weight, key) in FACES {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => self.fonts.base_font(weight),
                "Encoding" => "WinAnsiEncoding",
            });
            font_dict.set(key, font_id);
        }

        let mut xobjects = Dictionary::new();
        for (index, image) in images.iter().enumerate() {
            let stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(image.width),
                    "Height" => i64::from(image.height),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8_i64,
                },
                image.rgb.clone(),
            );
            let image_id = doc.add_object(stream);
            xobjects.set(format!("Im{index}"), image_id);
        }

        let resources_id = doc.add_object(dictionary! {
            "Font" => font_dict,
            "XObject" => xobjects,
        });

        let media_box: Vec<Object> = vec![
            Object::Integer(0),
            Object::Integer(0),
            self.geometry.width.into(),
            self.geometry.height.into(),
        ];

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for page in pages {
            let content = Content {
                operations: self.operations(page),
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
                "Resources" => resources_id,
                "MediaBox" => media_box,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => info_text(title),
            "Producer" => Object::string_literal("uwazi-report"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|err| ReportError::Compose(format!("failed to serialise PDF: {err}")))?;
        Ok(bytes)
    }

    /// Layout works top-down; PDF user space has its origin bottom-left.
    fn flip(&self, y: f32) -> f32 {
        self.geometry.height - y
    }

    fn operations(&self, page: &Page) -> Vec<Operation> {
        let mut ops = Vec::new();
        for op in &page.ops {
            match op {
                DrawOp::Text {
                    x,
                    baseline,
                    size,
                    weight,
                    color,
                    text,
                } => {
                    ops.push(Operation::new("BT", vec![]));
                    ops.push(Operation::new("Tf", vec![font_key(*weight).into(), (*size).into()]));
                    ops.push(Operation::new("rg", color.iter().map(|c| (*c).into()).collect()));
                    ops.push(Operation::new("Td", vec![(*x).into(), self.flip(*baseline).into()]));
                    ops.push(Operation::new(
                        "Tj",
                        vec![Object::String(self.policy.encode(text), StringFormat::Hexadecimal)],
                    ));
                    ops.push(Operation::new("ET", vec![]));
                }
                DrawOp::Image {
                    index,
                    x,
                    top,
                    width,
                    height,
                } => {
                    ops.push(Operation::new("q", vec![]));
                    ops.push(Operation::new(
                        "cm",
                        vec![
                            (*width).into(),
                            Object::Integer(0),
                            Object::Integer(0),
                            (*height).into(),
                            (*x).into(),
                            self.flip(top + height).into(),
                        ],
                    ));
                    ops.push(Operation::new("Do", vec![Object::Name(format!("Im{index}").into_bytes())]));
                    ops.push(Operation::new("Q", vec![]));
                }
                DrawOp::Rule {
                    x1,
                    x2,
                    y,
                    thickness,
                    color,
                } => {
                    let y = self.flip(*y);
                    ops.push(Operation::new("q", vec![]));
                    ops.push(Operation::new("RG", color.iter().map(|c| (*c).into()).collect()));
                    ops.push(Operation::new("w", vec![(*thickness).into()]));
                    ops.push(Operation::new("m", vec![(*x1).into(), y.into()]));
                    ops.push(Operation::new("l", vec![(*x2).into(), y.into()]));
                    ops.push(Operation::new("S", vec![]));
                    ops.push(Operation::new("Q", vec![]));
                }
            }
        }
        ops
    }
}

/// Document-information text string: UTF-16BE behind a byte-order mark, so
/// metadata keeps every character the page text may have replaced.
fn info_text(raw: &str) -> Object {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in raw.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
