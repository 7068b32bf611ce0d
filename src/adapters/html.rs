use crate::utils::error::{EnrichError, Result};
use scraper::{Html, Selector};

/// Compiles the `img.<class_marker>` selector for result thumbnails.
pub fn image_selector(class_marker: &str) -> Result<Selector> {
    Selector::parse(&format!("img.{}", class_marker)).map_err(|e| EnrichError::InvalidConfigValueError {
        field: "search.image_class".to_string(),
        value: class_marker.to_string(),
        reason: format!("not a usable CSS class: {}", e),
    })
}

/// `src` of the first element matching `selector`.
///
/// `Ok(None)` means the page had no matching image. A matching element
/// without a usable `src` counts as a malformed page.
pub fn first_image_src(html: &str, selector: &Selector) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let Some(element) = document.select(selector).next() else {
        return Ok(None);
    };

    match element.value().attr("src") {
        Some(src) if !src.trim().is_empty() => Ok(Some(src.to_string())),
        _ => Err(EnrichError::ParseError {
            message: "first matching image has no src attribute".to_string(),
        }),
    }
}
