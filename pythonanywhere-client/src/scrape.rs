//! HTML scraping against the platform's pages.
//!
//! The original extraction was regex over raw markup; this module queries a
//! parsed tree with CSS selectors instead, so attribute order and
//! insignificant whitespace changes in the vendor's markup cannot produce
//! false negatives. It is still scraping an uncontrolled third-party page:
//! the selectors mirror today's markup and live here, in one place.

use scraper::{ElementRef, Html, Selector};

use pythonanywhere_core::ClientError;

// ============================================================================
// Selectors
// ============================================================================

/// Hidden input carrying the Django CSRF token.
const CSRF_INPUT: &str = r#"input[name="csrfmiddlewaretoken"]"#;

/// Error paragraph shown on the login page when credentials are rejected.
const LOGIN_ERROR: &str = r#"p#id_login_error"#;

/// Per-app tab panes on the webapps page.
const APP_TAB_PANE: &str = "div.tab-pane";

/// Expiry date inside an app's tab pane.
const EXPIRY_STRONG: &str = "p.webapp_expiry strong";

fn selector(css: &str) -> Result<Selector, ClientError> {
    Selector::parse(css).map_err(|e| ClientError::Parse(format!("bad selector {css:?}: {e}")))
}

// ============================================================================
// Extraction
// ============================================================================

/// Extracts the hidden CSRF token from a page body, if present and
/// non-empty.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let input = Selector::parse(CSRF_INPUT).ok()?;
    document
        .select(&input)
        .next()?
        .value()
        .attr("value")
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Whether the login page body contains the credential-rejection fragment.
pub fn has_login_error(html: &str) -> bool {
    let document = Html::parse_document(html);
    Selector::parse(LOGIN_ERROR)
        .map(|p| document.select(&p).next().is_some())
        .unwrap_or(false)
}

/// Locates an app's tab pane on the webapps page and returns the expiry
/// date text inside it, still unparsed.
pub fn extract_app_expiry_text(html: &str, app_name: &str) -> Result<String, ClientError> {
    let document = Html::parse_document(html);
    let pane_selector = selector(APP_TAB_PANE)?;
    let strong_selector = selector(EXPIRY_STRONG)?;

    let pane_id = format!("id_{app_name}_pythonanywhere_com");
    let pane: ElementRef<'_> = document
        .select(&pane_selector)
        .find(|pane| pane.value().id() == Some(pane_id.as_str()))
        .ok_or_else(|| ClientError::NotFound(format!("no webapp tab for {app_name:?}")))?;

    let strong = pane
        .select(&strong_selector)
        .next()
        .ok_or_else(|| ClientError::NotFound(format!("no expiry fragment for {app_name:?}")))?;

    Ok(strong.text().collect::<String>().trim().to_string())
}
