//! Image similarity strategies: decode two base64 payloads and score how
//! alike they are

use base64::{engine::general_purpose, Engine as _};
use image::{imageops::FilterType, DynamicImage};
use thiserror::Error;

/// Side length of the grid both images are resized to before pixel diffing
const RESIZE_DIM: u32 = 20;

/// Bins per channel in the color histogram
const HIST_BINS: usize = 8;

/// Histogram bin width over the 0..256 value range
const BIN_WIDTH: usize = 256 / HIST_BINS;

/// Errors surfaced by a comparison. Base64 and image-container failures are
/// the client's fault; the rest are internal.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("incompatible image buffers: {0}")]
    Shape(String),

    #[error("worker pool is shut down")]
    PoolClosed,
}

/// The comparison strategy requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Pixel,
    ColorHistogram,
}

impl From<&str> for Method {
    /// Anything other than exactly "color_histogram" selects the pixel
    /// strategy. Unknown method names are not an error.
    fn from(s: &str) -> Self {
        match s {
            "color_histogram" => Method::ColorHistogram,
            _ => Method::Pixel,
        }
    }
}

/// Compare two base64-encoded images and return a similarity percentage.
///
/// The pixel strategy is nominally in [0, 100]; the histogram strategy is a
/// correlation and lands in [-100, 100]. Neither is clamped.
pub fn compare(image1: &str, image2: &str, method: Method) -> Result<f64, CompareError> {
    let img1 = decode_image(image1)?;
    let img2 = decode_image(image2)?;

    match method {
        Method::Pixel => pixel_compare(&img1, &img2),
        Method::ColorHistogram => Ok(histogram_compare(&img1, &img2)),
    }
}

/// Base64-decode a payload and decode the result as an image container.
/// The container's native channel layout is kept as-is.
fn decode_image(b64: &str) -> Result<DynamicImage, CompareError> {
    let bytes = general_purpose::STANDARD.decode(b64)?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Resize both images to a fixed 20x20 grid (aspect ratio is intentionally
/// ignored) and sum the byte-wise absolute differences.
///
/// The divisor is width * height * 255 with no channel-count factor, for
/// parity with the reference implementation; multi-channel inputs can score
/// below zero.
fn pixel_compare(img1: &DynamicImage, img2: &DynamicImage) -> Result<f64, CompareError> {
    let a = img1.resize_exact(RESIZE_DIM, RESIZE_DIM, FilterType::Triangle);
    let b = img2.resize_exact(RESIZE_DIM, RESIZE_DIM, FilterType::Triangle);

    let (abuf, bbuf) = (a.as_bytes(), b.as_bytes());
    if abuf.len() != bbuf.len() {
        return Err(CompareError::Shape(format!(
            "channel layouts differ: {:?} vs {:?}",
            a.color(),
            b.color()
        )));
    }

    let total: u64 = abuf
        .iter()
        .zip(bbuf)
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();

    let denom = f64::from(RESIZE_DIM * RESIZE_DIM) * 255.0;
    Ok((1.0 - total as f64 / denom) * 100.0)
}

/// Correlate the 8x8x8 color histograms of the two images.
fn histogram_compare(img1: &DynamicImage, img2: &DynamicImage) -> f64 {
    let h1 = color_histogram(img1);
    let h2 = color_histogram(img2);
    correlation(&h1, &h2) * 100.0
}

/// Build an L2-normalized 3D histogram over the first three channels,
/// 8 bins per channel. Grayscale inputs are expanded to three equal
/// channels so positional indexing stays well-defined.
fn color_histogram(img: &DynamicImage) -> Vec<f64> {
    let rgb = img.to_rgb8();
    let mut hist = vec![0f64; HIST_BINS * HIST_BINS * HIST_BINS];

    for px in rgb.pixels() {
        let r = px[0] as usize / BIN_WIDTH;
        let g = px[1] as usize / BIN_WIDTH;
        let b = px[2] as usize / BIN_WIDTH;
        hist[(r * HIST_BINS + g) * HIST_BINS + b] += 1.0;
    }

    let norm = hist.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > f64::EPSILON {
        for v in &mut hist {
            *v /= norm;
        }
    }
    hist
}

/// Pearson correlation between two histograms, in [-1, 1]. A degenerate
/// (zero-variance) denominator yields 1.0, matching the reference metric.
fn correlation(h1: &[f64], h2: &[f64]) -> f64 {
    let n = h1.len() as f64;
    let m1 = h1.iter().sum::<f64>() / n;
    let m2 = h2.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut d1 = 0.0;
    let mut d2 = 0.0;
    for (a, b) in h1.iter().zip(h2) {
        num += (a - m1) * (b - m2);
        d1 += (a - m1) * (a - m1);
        d2 += (b - m2) * (b - m2);
    }

    let denom = (d1 * d2).sqrt();
    if denom.abs() > f64::EPSILON {
        num / denom
    } else {
        1.0
    }
}
