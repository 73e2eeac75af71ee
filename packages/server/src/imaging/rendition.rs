//! Pure image operations behind a single rendition: format choice, fit
//! calculation, alpha flattening and encoding. No I/O happens here.

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageResult, Rgb, RgbImage};

use crate::config::RenditionSpec;

/// Upload extensions the pipeline accepts.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Encoding used for every rendition of one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
}

impl OutputFormat {
    /// `jpg` and `jpeg` map to JPEG, `png` and `gif` keep their format, and
    /// anything else falls back to JPEG.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "png" => OutputFormat::Png,
            "gif" => OutputFormat::Gif,
            _ => OutputFormat::Jpeg,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Gif => "image/gif",
        }
    }
}

/// Lower-cased extension of `filename` if it is on the allow-list.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Target size for `source` inside the `bound` box, or `None` when the
/// source already fits. Aspect ratio is preserved and each side is
/// truncated, never below 1 px.
pub fn fit_within(source: (u32, u32), bound: (u32, u32)) -> Option<(u32, u32)> {
    let (sw, sh) = (u64::from(source.0), u64::from(source.1));
    let (tw, th) = (u64::from(bound.0), u64::from(bound.1));
    if sw == 0 || sh == 0 || (sw <= tw && sh <= th) {
        return None;
    }

    // Integer form of ratio = min(tw/sw, th/sh), so bounded sides land exactly.
    let (w, h) = if tw * sh <= th * sw {
        (tw, sh * tw / sw)
    } else {
        (sw * th / sh, th)
    };
    Some((w.max(1) as u32, h.max(1) as u32))
}

/// Composite any alpha channel onto an opaque white background.
pub fn flatten_alpha(img: DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return img;
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut out = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let a = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    DynamicImage::ImageRgb8(out)
}

/// Flatten, downscale and encode one rendition of `source`.
pub fn render(
    source: DynamicImage,
    spec: &RenditionSpec,
    format: OutputFormat,
    quality: u8,
) -> ImageResult<Vec<u8>> {
    let mut img = flatten_alpha(source);
    if let Some((w, h)) = fit_within((img.width(), img.height()), (spec.max_width, spec.max_height))
    {
        img = img.resize_exact(w, h, FilterType::Lanczos3);
    }
    encode(&img, format, quality)
}

pub fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
        }
        OutputFormat::Png => {
            img.write_with_encoder(PngEncoder::new(&mut buf))?;
        }
        OutputFormat::Gif => {
            let rgba = img.to_rgba8();
            let mut encoder = GifEncoder::new(&mut buf);
            encoder.encode(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
    }
    Ok(buf)
}
