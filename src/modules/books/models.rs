use bookworm_db::BookWithOwner;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// New book payload. `image` is a data URI or remote URL handed to the media host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub image: Option<String>,
    pub rating: Option<i64>,
}

/// Raw `?page=&limit=` values. Kept as strings so junk falls back to defaults
/// instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u64,
    pub limit: u64,
}

impl Paging {
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit.max(1))
    }
}

impl From<PageQuery> for Paging {
    fn from(query: PageQuery) -> Self {
        Self {
            page: parse_positive(query.page.as_deref(), DEFAULT_PAGE),
            limit: parse_positive(query.limit.as_deref(), DEFAULT_LIMIT),
        }
    }
}

fn parse_positive(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|raw| raw.trim().parse::<i64>().ok())
        .map(|value| value.max(1).unsigned_abs())
        .unwrap_or(default)
}

/// One page of the shared feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPage {
    pub books: Vec<BookWithOwner>,
    pub current_page: u64,
    pub total_books: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
