use serde::Serialize;

use crate::pagination::Paged;

#[derive(Debug, Serialize)]
pub struct Pager {
    pub current: i64,
    pub total: i64,
}

/// `{ "message": "OK", "data": ..., "pager": ... }` envelope used by every
/// successful response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub message: &'static str,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pager: Option<Pager>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            message: "OK",
            data,
            pager: None,
        }
    }
}

impl<T: Serialize> From<Paged<T>> for ApiResponse<Vec<T>> {
    fn from(page: Paged<T>) -> Self {
        Self {
            message: "OK",
            data: page.items,
            pager: Some(Pager {
                current: page.current_page,
                total: page.total_pages,
            }),
        }
    }
}
