//! Page cursor for paginated listings

use crate::extract::NextPage;
use url::Url;

/// Query parameters owned by the cursor
const CURSOR_PARAMS: &[&str] = &["to", "from", "cursor", "page"];

/// Position in a paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// 1-based page number
    pub page: u32,

    /// URL to request for this page
    pub url: Url,
}

impl Cursor {
    /// Cursor for the first page
    pub fn start(url: Url) -> Self {
        Self { page: 1, url }
    }

    /// Cursor for the page after this one
    ///
    /// # Arguments
    ///
    /// * `next` - The hint parsed from the current page
    /// * `origin` - The listing's first-page URL; tokens and page numbers are
    ///   applied to it
    ///
    /// # Returns
    ///
    /// * `Some(Cursor)` - The next page to request
    /// * `None` - The listing has no further pages
    pub fn advance(&self, next: &NextPage, origin: &Url) -> Option<Cursor> {
        let page = self.page + 1;
        let url = match next {
            NextPage::End => return None,
            NextPage::Url(url) => url.clone(),
            NextPage::Token { key, value } => with_cursor_param(origin, key, value),
            NextPage::Unknown => with_cursor_param(origin, "page", &page.to_string()),
        };
        Some(Cursor { page, url })
    }
}

fn with_cursor_param(origin: &Url, key: &str, value: &str) -> Url {
    let kept: Vec<(String, String)> = origin
        .query_pairs()
        .filter(|(name, _)| !CURSOR_PARAMS.contains(&name.as_ref()))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    let mut url = origin.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(key, value);
    url
}
