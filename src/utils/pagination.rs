use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Raw `?page=&limit=` query. Kept as strings so junk falls back to defaults
/// instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).filter(|n| *n > 0)
}

impl From<&PageQuery> for PageRequest {
    fn from(q: &PageQuery) -> Self {
        let limit = positive(q.limit.as_deref()).unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        // The driver sends skip as i64.
        let last_page = i64::MAX as u64 / limit + 1;
        PageRequest {
            page: positive(q.page.as_deref()).unwrap_or(DEFAULT_PAGE).min(last_page),
            limit,
        }
    }
}

impl PageRequest {
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Serialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u64,
}

impl Pagination {
    pub fn new(req: PageRequest, total_items: u64) -> Self {
        Pagination {
            current_page: req.page,
            total_pages: total_items.div_ceil(req.limit),
            total_items,
            items_per_page: req.limit,
        }
    }
}
