//! Page-number pagination on top of forward-only cursors.
//!
//! The backend only hands out opaque `endCursor` tokens. A page number is
//! reached by walking forward with cheap `pageInfo`-only requests, and
//! secondary lists are drained by following cursors until the backend
//! reports no further pages.

use std::future::Future;

use async_stream::try_stream;
use futures::{Stream, TryStreamExt};
use tracing::debug;

use crate::api_types::{Connection, PageInfo};
use crate::error::CatalogError;
use crate::types::{Page, PageMeta};

/// Advance past a page described by `page_info`.
///
/// `previous` is the cursor the page was requested with. A backend that
/// hands the same cursor back would make the walk loop forever.
fn next_cursor(page_info: &PageInfo, previous: Option<&str>) -> Result<String, CatalogError> {
    let Some(cursor) = page_info.end_cursor.as_deref() else {
        return Err(CatalogError::ProtocolViolation(
            "hasNextPage is set but endCursor is missing".to_string(),
        ));
    };

    if previous == Some(cursor) {
        return Err(CatalogError::PaginationStalled {
            cursor: cursor.to_string(),
        });
    }

    Ok(cursor.to_string())
}

/// Fetch page `page` of a cursor listing.
///
/// `skip` fetches only the `pageInfo` of the page after the given cursor and
/// is called `page - 1` times. `fetch` is called once for the requested page.
/// Both are expected to request the same page size.
///
/// Returns `None` when the listing ends before `page` is reached.
pub(crate) async fn seek_page<T, S, SFut, F, FFut>(
    page: u32,
    mut skip: S,
    fetch: F,
) -> Result<Option<Connection<T>>, CatalogError>
where
    S: FnMut(Option<String>) -> SFut,
    SFut: Future<Output = Result<PageInfo, CatalogError>>,
    F: FnOnce(Option<String>) -> FFut,
    FFut: Future<Output = Result<Connection<T>, CatalogError>>,
{
    let mut cursor: Option<String> = None;

    for skipped in 1..page {
        let page_info = skip(cursor.clone()).await?;
        if !page_info.has_next_page {
            debug!(page, skipped, "listing ended before the requested page");
            return Ok(None);
        }
        cursor = Some(next_cursor(&page_info, cursor.as_deref())?);
    }

    fetch(cursor).await.map(Some)
}

/// Assemble a [Page] from the connection returned by [seek_page].
///
/// Items beyond `limit` are dropped so the page never exceeds its size.
pub(crate) fn into_page<T>(
    connection: Option<Connection<T>>,
    total: u64,
    page: u32,
    limit: u32,
) -> Page<T> {
    let Some(connection) = connection else {
        return Page::empty(total, page, limit);
    };

    let mut items = connection.nodes;
    items.truncate(limit as usize);

    Page {
        items,
        meta: PageMeta {
            total,
            page,
            limit,
            has_next: connection.page_info.has_next_page,
            has_prev: page > 1,
        },
    }
}

/// Create a stream of all items after `after`, following cursors.
///
/// `fetch` returns the page following the given cursor.
pub(crate) fn make_cursor_stream<T, F, Fut>(
    after: Option<String>,
    fetch: F,
) -> impl Stream<Item = Result<T, CatalogError>>
where
    F: Fn(Option<String>) -> Fut,
    Fut: Future<Output = Result<Connection<T>, CatalogError>>,
{
    try_stream! {
        let mut cursor = after;

        loop {
            let connection = fetch(cursor.clone()).await?;

            for item in connection.nodes {
                yield item;
            }

            if !connection.page_info.has_next_page {
                break;
            }
            cursor = Some(next_cursor(&connection.page_info, cursor.as_deref())?);
        }
    }
}

/// Collect every item after `after` in backend order.
pub(crate) async fn collect_remaining<T, F, Fut>(
    after: Option<String>,
    fetch: F,
) -> Result<Vec<T>, CatalogError>
where
    F: Fn(Option<String>) -> Fut,
    Fut: Future<Output = Result<Connection<T>, CatalogError>>,
{
    make_cursor_stream(after, fetch).try_collect().await
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    /// An in-memory listing of `0..len` served in pages of `size`.
    ///
    /// Cursors are the index of the last item on a page.
    struct Listing {
        len: usize,
        size: usize,
    }

    impl Listing {
        fn start(cursor: Option<String>) -> usize {
            cursor.map_or(0, |cursor| cursor.parse::<usize>().unwrap() + 1)
        }

        fn page_info(&self, start: usize) -> PageInfo {
            let end = (start + self.size).min(self.len);
            PageInfo {
                has_next_page: end < self.len,
                has_previous_page: start > 0,
                end_cursor: (end > start).then(|| (end - 1).to_string()),
            }
        }

        fn connection(&self, cursor: Option<String>) -> Connection<usize> {
            let start = Self::start(cursor);
            let end = (start + self.size).min(self.len);
            Connection {
                nodes: (start..end).collect(),
                page_info: self.page_info(start),
            }
        }
    }

    async fn serve(listing: &Listing, page: u32, calls: &RefCell<u32>) -> Page<usize> {
        let connection = seek_page(
            page,
            |cursor| {
                *calls.borrow_mut() += 1;
                let info = listing.page_info(Listing::start(cursor));
                async move { Ok(info) }
            },
            |cursor| {
                *calls.borrow_mut() += 1;
                let connection = listing.connection(cursor);
                async move { Ok(connection) }
            },
        )
        .await
        .unwrap();
        into_page(connection, listing.len as u64, page, listing.size as u32)
    }

    #[tokio::test]
    async fn first_page_needs_no_skips() {
        let listing = Listing { len: 5, size: 2 };
        let calls = RefCell::new(0);
        let page = serve(&listing, 1, &calls).await;
        assert_eq!(page.items, vec![0, 1]);
        assert_eq!(page.meta, PageMeta {
            total: 5,
            page: 1,
            limit: 2,
            has_next: true,
            has_prev: false,
        });
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn later_page_walks_forward() {
        let listing = Listing { len: 5, size: 2 };
        let calls = RefCell::new(0);
        let page = serve(&listing, 3, &calls).await;
        assert_eq!(page.items, vec![4]);
        assert!(!page.meta.has_next);
        assert!(page.meta.has_prev);
        assert_eq!(*calls.borrow(), 3);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let listing = Listing { len: 4, size: 2 };
        let calls = RefCell::new(0);
        let page = serve(&listing, 7, &calls).await;
        assert_eq!(page, Page::empty(4, 7, 2));
        assert!(page.meta.has_prev);
        // stops at the first skip that reports no next page
        assert_eq!(*calls.borrow(), 2);
    }

    #[tokio::test]
    async fn missing_cursor_is_a_protocol_violation() {
        let result = seek_page(
            2,
            |_| async {
                Ok(PageInfo {
                    has_next_page: true,
                    has_previous_page: false,
                    end_cursor: None,
                })
            },
            |_| async { Ok(Connection::<u8> { nodes: vec![], page_info: PageInfo::default() }) },
        )
        .await;
        assert!(matches!(result, Err(CatalogError::ProtocolViolation(_))));
    }

    #[tokio::test]
    async fn collects_all_remaining_items_in_order() {
        let listing = Listing { len: 7, size: 3 };
        let items = collect_remaining(Some("2".to_string()), |cursor| {
            let connection = listing.connection(cursor);
            async move { Ok(connection) }
        })
        .await
        .unwrap();
        assert_eq!(items, vec![3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn repeated_cursor_stalls() {
        let result = collect_remaining(Some("c1".to_string()), |_| async {
            Ok(Connection {
                nodes: vec![1],
                page_info: PageInfo {
                    has_next_page: true,
                    has_previous_page: true,
                    end_cursor: Some("c1".to_string()),
                },
            })
        })
        .await;
        match result {
            Err(CatalogError::PaginationStalled { cursor }) => assert_eq!(cursor, "c1"),
            other => panic!("expected stalled pagination, found: {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn pages_never_exceed_limit(len in 0usize..60, size in 1usize..=10, page in 1u32..12) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let listing = Listing { len, size };
            let calls = RefCell::new(0);
            let served = runtime.block_on(serve(&listing, page, &calls));

            prop_assert!(served.items.len() <= size);
            prop_assert_eq!(served.meta.has_prev, page > 1);

            let start = (page as usize - 1) * size;
            if start >= len && page > 1 {
                prop_assert!(served.items.is_empty());
                prop_assert!(!served.meta.has_next);
            } else {
                let expected: Vec<usize> = (start..(start + size).min(len)).collect();
                prop_assert_eq!(served.items, expected);
            }
        }
    }
}
