use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::fetch::PageFetcher;
use crate::locate::locate_post_url;
use crate::models::ExtractedContent;

// ── Meta-tag dispatch table ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaField {
    Title,
    Content,
    Image,
    Likes,
    Comments,
    Collects,
}

const META_FIELDS: &[(&str, MetaField)] = &[
    ("og:title", MetaField::Title),
    ("description", MetaField::Content),
    ("og:image", MetaField::Image),
    ("og:xhs:note_like", MetaField::Likes),
    ("og:xhs:note_comment", MetaField::Comments),
    ("og:xhs:note_collect", MetaField::Collects),
];

static META_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").unwrap());

// ── Public API ───────────────────────────────────────────────────────────────

/// Locate a post link in free text, then fetch and extract it.
///
/// Returns the located URL alongside the record.
pub async fn extract_from_text(
    fetcher: &PageFetcher,
    text: &str,
) -> Result<(String, ExtractedContent), ExtractionError> {
    let url = locate_post_url(text)?;
    info!(url, "located post link in input text");
    let content = extract_post(fetcher, url).await?;
    Ok((url.to_string(), content))
}

pub async fn extract_post(
    fetcher: &PageFetcher,
    url: &str,
) -> Result<ExtractedContent, ExtractionError> {
    let page = fetcher.fetch(url).await?;
    let content = extract_from_html(&page.body)?;
    debug!(
        url = %page.url,
        title = ?content.title,
        images = content.image_urls.len(),
        "extracted post metadata"
    );
    Ok(content)
}

// ── Main extraction pipeline ─────────────────────────────────────────────────

/// Read the known meta tags out of a post page.
///
/// Every field is independently optional. Only a body with nothing to parse
/// fails.
pub fn extract_from_html(html: &str) -> Result<ExtractedContent, ExtractionError> {
    if html.trim().is_empty() {
        return Err(ExtractionError::Unparseable);
    }

    let document = Html::parse_document(html);
    let mut out = ExtractedContent::default();

    for meta in document.select(&META_SEL) {
        let el = meta.value();
        let Some(key) = el.attr("name") else {
            continue;
        };
        let Some(field) = lookup_field(key) else {
            continue;
        };
        let value = el.attr("content");

        let slot = match field {
            MetaField::Image => {
                if let Some(src) = value.filter(|s| !s.is_empty()) {
                    out.image_urls.push(src.to_string());
                }
                continue;
            }
            MetaField::Title => &mut out.title,
            MetaField::Content => &mut out.content,
            MetaField::Likes => &mut out.likes,
            MetaField::Comments => &mut out.comments,
            MetaField::Collects => &mut out.collects,
        };
        // First occurrence wins.
        if slot.is_none() {
            *slot = Some(value.unwrap_or_default().to_string());
        }
    }

    Ok(out)
}

fn lookup_field(key: &str) -> Option<MetaField> {
    META_FIELDS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, field)| *field)
}
