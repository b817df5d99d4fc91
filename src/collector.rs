use futures::{Future, StreamExt, stream};
use serde::Deserialize;
use tracing::warn;

use crate::error::SyncError;

/// Documented page cap shared by both provider APIs.
pub const MAX_PAGE_LIMIT: u32 = 50;

/// Bounded in-flight requests for offset-addressable page fetches.
pub const MAX_IN_FLIGHT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub limit: u32,
    pub offset: u32,
}

/// One page of an offset-paginated endpoint. The provider reports the total
/// item count on every page.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub total: u32,
    // `default = "Vec::new"` keeps the derive from demanding `T: Default`.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// One page of a cursor-paginated endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CursorPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

pub fn validate_limit(limit: u32) -> Result<(), SyncError> {
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(SyncError::Validation(format!(
            "invalid page limit {limit}, must be between 1 and {MAX_PAGE_LIMIT}"
        )));
    }
    Ok(())
}

/// Drive an offset-addressable paged endpoint to exhaustion.
///
/// The first page is fetched alone to learn the total; a failed first request
/// or a zero total yields an empty list, never an error. The remaining page
/// queries are built eagerly and fetched through a bounded pool, so pages come
/// back in arrival order — callers must not assume page ordering.
pub async fn collect_offset<T, F, Fut>(
    fetch: F,
    limit: u32,
    offset: u32,
) -> Result<Vec<Page<T>>, SyncError>
where
    F: Fn(PageQuery) -> Fut,
    Fut: Future<Output = Result<Page<T>, SyncError>>,
{
    validate_limit(limit)?;

    let first = match fetch(PageQuery { limit, offset }).await {
        Ok(page) => page,
        Err(e) => {
            warn!(error = %e, "first page request failed, treating as empty");
            return Ok(Vec::new());
        }
    };

    if first.total == 0 {
        return Ok(Vec::new());
    }

    let total_pages = first.total / limit + 1;
    let queries: Vec<PageQuery> = (1..total_pages)
        .map(|page| PageQuery {
            limit,
            offset: offset + limit * page,
        })
        .collect();

    let mut pages = vec![first];
    let results: Vec<Result<Page<T>, SyncError>> = stream::iter(queries)
        .map(|query| fetch(query))
        .buffer_unordered(MAX_IN_FLIGHT)
        .collect()
        .await;

    for result in results {
        match result {
            Ok(page) => pages.push(page),
            // Absorbed: one page's failure never aborts the batch.
            Err(e) => warn!(error = %e, "page request failed, skipping page"),
        }
    }

    Ok(pages)
}

/// Drive a cursor-addressable paged endpoint to exhaustion.
///
/// The next-page token is only known after the prior fetch, so this path is
/// strictly sequential. A failed first request yields an empty list; a
/// mid-stream failure stops collection with the pages gathered so far.
pub async fn collect_cursor<T, F, Fut>(fetch: F) -> Result<Vec<CursorPage<T>>, SyncError>
where
    F: Fn(Option<String>) -> Fut,
    Fut: Future<Output = Result<CursorPage<T>, SyncError>>,
{
    let mut pages: Vec<CursorPage<T>> = Vec::new();
    let mut token: Option<String> = None;

    loop {
        match fetch(token.clone()).await {
            Ok(page) => {
                token = page.next_page_token.clone();
                pages.push(page);
                if token.is_none() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, pages = pages.len(), "cursor page request failed");
                break;
            }
        }
    }

    Ok(pages)
}
