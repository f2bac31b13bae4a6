// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("No Xiaohongshu link found in the input text")]
    NoUrlFound,
    #[error("{0}")]
    InvalidUrl(String),
    #[error("{0}")]
    InvalidSaveDir(String),
    #[error("Upstream returned HTTP {0}")]
    Upstream(u16),
    #[error("{0}")]
    Request(String),
    #[error("Page body could not be parsed as HTML")]
    Unparseable,
    #[error("Could not extract any content, check that the link is valid")]
    ExtractionEmpty,
    #[error("None of the {0} images could be downloaded")]
    ImageDownloadFailed(usize),
}

impl ExtractionError {
    /// Transport or status failure while reaching the post page.
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, ExtractionError::Upstream(_) | ExtractionError::Request(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_are_grouped() {
        assert!(ExtractionError::Upstream(404).is_fetch_error());
        assert!(ExtractionError::Request("TimeoutError: x".into()).is_fetch_error());
        assert!(!ExtractionError::NoUrlFound.is_fetch_error());
        assert!(!ExtractionError::ExtractionEmpty.is_fetch_error());
    }

    #[test]
    fn distinct_messages_for_caller_visible_failures() {
        let no_url = ExtractionError::NoUrlFound.to_string();
        let empty = ExtractionError::ExtractionEmpty.to_string();
        let images = ExtractionError::ImageDownloadFailed(3).to_string();
        assert_ne!(no_url, empty);
        assert_ne!(empty, images);
        assert_eq!(images, "None of the 3 images could be downloaded");
    }
}
