use serde::Deserialize;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Raw `?offset=&limit=` query parameters.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Normalized offset/limit window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    /// Negative offsets become 0; limits are clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn from_query(query: PageQuery) -> Self {
        let offset = query
            .offset
            .map(|value| value.clamp(0, i64::from(u32::MAX)) as u32)
            .unwrap_or(0);
        let limit = query
            .limit
            .map(|value| value.clamp(1, i64::from(MAX_PAGE_LIMIT)) as u32)
            .unwrap_or(DEFAULT_PAGE_LIMIT);

        Self { offset, limit }
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, Page, PageQuery};

    #[test]
    fn defaults_apply_when_missing() {
        let page = Page::from_query(PageQuery::default());
        assert_eq!(page.offset, 0);
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn values_are_clamped() {
        let page = Page::from_query(PageQuery {
            offset: Some(-5),
            limit: Some(10_000),
        });
        assert_eq!(page, Page { offset: 0, limit: MAX_PAGE_LIMIT });

        let page = Page::from_query(PageQuery {
            offset: Some(40),
            limit: Some(0),
        });
        assert_eq!(page, Page { offset: 40, limit: 1 });
    }
}
