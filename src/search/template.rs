//! URL templates for the two delivery pipelines.
//!
//! ```text
//! reference: {base}{image_path}?tr=h-{height},w-{width}
//! candidate: {base}/{width}x{height}/filters:quality({quality}){image_path}
//! ```

use crate::types::Dimensions;
use serde::{Deserialize, Serialize};

/// URL family of the reference pipeline (query-string transforms).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTemplate {
    pub base: String,
}

impl ReferenceTemplate {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn render(&self, image_path: &str, size: Dimensions) -> String {
        // The base is used verbatim unless the path brings its own slash.
        let base = if image_path.starts_with('/') {
            self.base.trim_end_matches('/')
        } else {
            self.base.as_str()
        };
        format!("{}{}?tr=h-{},w-{}", base, image_path, size.height, size.width)
    }
}

/// URL family of the candidate pipeline (path-segment transforms).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTemplate {
    pub base: String,
}

impl CandidateTemplate {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn render(&self, image_path: &str, size: Dimensions, quality: u8) -> String {
        format!(
            "{}/{}x{}/filters:quality({})/{}",
            self.base.trim_end_matches('/'),
            size.width,
            size.height,
            quality,
            image_path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: &str = "/catalog/product/1/4/14.___xmcp01949_4.jpg";

    #[test]
    fn reference_puts_height_first() {
        let template = ReferenceTemplate::new("https://ref.example.com");
        assert_eq!(
            template.render(IMAGE, Dimensions::new(135, 191)),
            "https://ref.example.com/catalog/product/1/4/14.___xmcp01949_4.jpg?tr=h-191,w-135"
        );
    }

    #[test]
    fn candidate_embeds_size_and_quality() {
        let template = CandidateTemplate::new("https://cand.example.net");
        assert_eq!(
            template.render(IMAGE, Dimensions::new(707, 1000), 50),
            "https://cand.example.net/707x1000/filters:quality(50)/catalog/product/1/4/14.___xmcp01949_4.jpg"
        );
    }

    #[test]
    fn trailing_slash_on_base_is_not_doubled() {
        let template = CandidateTemplate::new("https://cand.example.net/");
        assert!(
            template
                .render("/a.jpg", Dimensions::new(1, 2), 3)
                .starts_with("https://cand.example.net/1x2/")
        );
        let reference = ReferenceTemplate::new("https://ref.example.com/");
        assert_eq!(
            reference.render("/a.jpg", Dimensions::new(1, 2)),
            "https://ref.example.com/a.jpg?tr=h-2,w-1"
        );
    }

    #[test]
    fn relative_path_keeps_the_base_separator() {
        let reference = ReferenceTemplate::new("https://cdn.example.com/images/");
        assert_eq!(
            reference.render("photo.jpg", Dimensions::new(135, 191)),
            "https://cdn.example.com/images/photo.jpg?tr=h-191,w-135"
        );
        let candidate = CandidateTemplate::new("https://cand.example.net");
        assert_eq!(
            candidate.render("photo.jpg", Dimensions::new(135, 191), 40),
            "https://cand.example.net/135x191/filters:quality(40)/photo.jpg"
        );
    }
}
