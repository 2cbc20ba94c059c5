// =============================================================================
// Image Verdict — placeholder heuristic for uploaded images
// =============================================================================
//
// Not a deepfake detector. The verdict confidence is drawn uniformly from
// [75, 98); only brightness and contrast are measured from the pixels.
// =============================================================================

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::types::round2;

const CONFIDENCE_RANGE: std::ops::Range<f64> = 75.0..98.0;
const FAKE_BELOW: f64 = 85.0;

const DIM_BELOW: f64 = 80.0;
const BRIGHT_ABOVE: f64 = 200.0;
const LOW_CONTRAST_BELOW: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageLabel {
    Authentic,
    Fake,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageVerdict {
    pub result: ImageLabel,
    pub confidence: f64,
    pub brightness: f64,
    pub contrast: f64,
    pub risk_factors: Vec<String>,
}

/// Mean and population standard deviation over every RGB channel value.
pub fn brightness_contrast(pixels: &[u8]) -> (f64, f64) {
    if pixels.is_empty() {
        return (0.0, 0.0);
    }
    let n = pixels.len() as f64;
    let mean = pixels.iter().map(|&p| f64::from(p)).sum::<f64>() / n;
    let variance = pixels
        .iter()
        .map(|&p| {
            let d = f64::from(p) - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}

pub fn risk_factors(brightness: f64, contrast: f64) -> Vec<String> {
    let mut factors = Vec::new();
    if !(DIM_BELOW..=BRIGHT_ABOVE).contains(&brightness) {
        factors.push("Unusual brightness".to_string());
    }
    if contrast < LOW_CONTRAST_BELOW {
        factors.push("Low contrast".to_string());
    }
    factors
}

/// Decode `bytes` and produce a verdict with a random placeholder confidence.
pub fn analyze_image(bytes: &[u8]) -> Result<ImageVerdict, AnalysisError> {
    let confidence = rand::thread_rng().gen_range(CONFIDENCE_RANGE);
    analyze_image_with(bytes, confidence)
}

/// As [`analyze_image`] with a caller-chosen confidence.
pub fn analyze_image_with(bytes: &[u8], confidence: f64) -> Result<ImageVerdict, AnalysisError> {
    let rgb = image::load_from_memory(bytes)
        .map_err(|e| AnalysisError::InvalidImage(e.to_string()))?
        .to_rgb8();

    let (brightness, contrast) = brightness_contrast(rgb.as_raw());
    let result = if confidence < FAKE_BELOW {
        ImageLabel::Fake
    } else {
        ImageLabel::Authentic
    };

    Ok(ImageVerdict {
        result,
        confidence: round2(confidence),
        brightness: round2(brightness),
        contrast: round2(contrast),
        risk_factors: risk_factors(brightness, contrast),
    })
}
