//! Offset/limit pagination

use std::future::Future;

use crate::error::{Error, Result};

/// Offset and size of one requested page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    /// Index of the first item
    pub offset: u32,
    /// Number of items requested
    pub limit: u32,
}

/// Number of pages needed to cover `total` items
pub fn page_count(total: u32, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Fetch a whole collection page by page
///
/// Pages are requested at offsets `0, page_size, 2 * page_size, ...`, each with
/// `limit = page_size`. Fetching stops after the first page holding fewer than
/// `page_size` items. Items are returned in fetch order. Any failed page fails
/// the whole call.
pub async fn fetch_all<T, F, Fut>(page_size: u32, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(Page) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    if page_size == 0 {
        return Err(Error::Config {
            message: "page size must be at least 1".to_string(),
            key: None,
        });
    }

    let mut items = Vec::new();
    let mut offset = 0u32;
    loop {
        let page = fetch_page(Page {
            offset,
            limit: page_size,
        })
        .await?;
        let fetched = page.len();
        items.extend(page);

        if fetched < page_size as usize {
            return Ok(items);
        }
        offset = offset.saturating_add(page_size);
    }
}
