use serde::{Deserialize, Serialize};

/// Metadata pulled from a single post page.
///
/// Engagement counters are kept as the raw text the site renders ("1.2万").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_urls: Vec<String>,
    pub likes: Option<String>,
    pub comments: Option<String>,
    pub collects: Option<String>,
}

impl ExtractedContent {
    /// True when either the title or the description carries non-blank text.
    pub fn has_text(&self) -> bool {
        [&self.title, &self.content]
            .iter()
            .any(|f| f.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    pub fn has_engagement(&self) -> bool {
        self.likes.is_some() || self.comments.is_some() || self.collects.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct ExtractTextRequest {
    pub text: String,
    #[serde(default)]
    pub download_images: bool,
    #[serde(default)]
    pub save_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractUrlRequest {
    pub url: String,
    #[serde(default)]
    pub download_images: bool,
    #[serde(default)]
    pub save_dir: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    #[serde(flatten)]
    pub content: ExtractedContent,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_images: Option<Vec<String>>,
}
