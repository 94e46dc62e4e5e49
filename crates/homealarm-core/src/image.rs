use rand::Rng;

use crate::domain::Image;

/// Classifies camera frames.
pub trait ImageService {
    /// True when `image` contains a cat with at least `confidence_threshold`
    /// percent confidence.
    fn image_contains_cat(&self, image: &Image, confidence_threshold: f32) -> bool;
}

/// Stand-in classifier for running without a vision backend. Answers at
/// random unless pinned with [`FakeImageService::always`].
#[derive(Debug, Clone, Default)]
pub struct FakeImageService {
    fixed: Option<bool>,
}

impl FakeImageService {
    pub fn new() -> Self { Self::default() }

    pub fn always(answer: bool) -> Self { Self { fixed: Some(answer) } }
}

impl ImageService for FakeImageService {
    fn image_contains_cat(&self, image: &Image, confidence_threshold: f32) -> bool {
        let answer = self.fixed.unwrap_or_else(|| rand::thread_rng().gen_bool(0.5));
        log::debug!(
            "fake image service: {} bytes, threshold {:.1} -> cat={}",
            image.bytes.len(), confidence_threshold, answer
        );
        answer
    }
}
