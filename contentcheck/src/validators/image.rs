use crate::check::{CheckResult, ContentCheck, fail};

/// Maximum size of an integration image in bytes.
pub const IMAGE_MAX_SIZE: u64 = 10 * 1024;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Where an integration image was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A package image file of the given size.
    File { size: u64 },
    /// The `image` field of a unified definition.
    Embedded(String),
    /// No image could be found.
    Missing,
}

/// Validator for integration images.
#[derive(Debug)]
pub struct ImageValidator {
    path: String,
    source: ImageSource,
}

impl ImageValidator {
    #[must_use]
    pub fn new(path: impl Into<String>, source: ImageSource) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    fn decoded_size(data: &str) -> u64 {
        let payload = data.strip_prefix(DATA_URL_PREFIX).unwrap_or(data);
        let padding = payload.chars().rev().take_while(|c| *c == '=').count() as u64;
        (payload.len() as u64).div_euclid(4).saturating_mul(3).saturating_sub(padding)
    }
}

impl ContentCheck for ImageValidator {
    fn is_valid(&self) -> CheckResult {
        let size = match &self.source {
            ImageSource::Missing => {
                return fail(format!("{}: integration has no image", self.path));
            }
            ImageSource::File { size } => *size,
            ImageSource::Embedded(data) => {
                if !data.starts_with(DATA_URL_PREFIX) {
                    return fail(format!("{}: image must be a base64 encoded png", self.path));
                }
                Self::decoded_size(data)
            }
        };
        if size > IMAGE_MAX_SIZE {
            fail(format!(
                "{}: image is {size} bytes, the maximum is {IMAGE_MAX_SIZE}",
                self.path
            ))
        } else {
            Ok(())
        }
    }
}
