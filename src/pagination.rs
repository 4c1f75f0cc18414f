//! Offset/page arithmetic shared by every listing endpoint.
//!
//! A listing counts its rows, calls [`paginate`], fetches `limit()` rows at
//! `offset`, and hands them to [`PageWindow::into_page`]. Page 1 is always a
//! valid page even over an empty collection; any other empty page is
//! [`AppError::PageNotFound`].

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const MAX_PER_PAGE: i64 = 100;

/// `?page=&perPage=` query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page", rename = "perPage")]
    pub per_page: i64,
}
fn default_page() -> i64 {
    1
}
fn default_per_page() -> i64 {
    10
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
    pub offset: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub total_pages: i64,
}

pub fn paginate(page: i64, per_page: i64, total_count: i64) -> AppResult<PageWindow> {
    if page < 1 {
        return Err(AppError::PageNotFound);
    }
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(AppError::Validation(format!(
            "perPage must be between 1 and {MAX_PER_PAGE}"
        )));
    }
    let offset = (page - 1).saturating_mul(per_page).max(0);
    let total_count = total_count.max(0);
    let total_pages = total_count / per_page + i64::from(total_count % per_page != 0);
    Ok(PageWindow {
        page,
        per_page,
        offset,
        total_pages,
    })
}

impl PageWindow {
    pub fn for_query(query: PageQuery, total_count: i64) -> AppResult<Self> {
        paginate(query.page, query.per_page, total_count)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn into_page<T>(self, items: Vec<T>) -> AppResult<Paged<T>> {
        if items.is_empty() && self.page != 1 {
            return Err(AppError::PageNotFound);
        }
        Ok(Paged {
            items,
            current_page: self.page,
            total_pages: self.total_pages,
        })
    }
}

impl<T> Paged<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            total_pages: self.total_pages,
        }
    }
}
