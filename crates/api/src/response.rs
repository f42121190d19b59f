//! JSON envelope shared by every endpoint.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use store::ProductPage;

/// `{ success, data?, message?, count? }`, plus paging fields on catalog listings.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u64>,
}

impl<T: Serialize> ApiResponse<T> {
    fn empty(success: bool) -> Self {
        Self {
            success,
            data: None,
            message: None,
            count: None,
            total: None,
            page: None,
            pages: None,
        }
    }

    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::empty(true)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Responds with `201 Created`.
    pub fn created(self) -> (StatusCode, Self) {
        (StatusCode::CREATED, self)
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        Self {
            count: Some(count),
            ..Self::ok(items)
        }
    }
}

impl ApiResponse<Vec<domain::Product>> {
    /// One catalog page; `pages` is derived from `total` and the page size.
    pub fn page(result: ProductPage, page: u32, limit: u32) -> Self {
        let pages = result.total.div_ceil(u64::from(limit.max(1)));
        Self {
            total: Some(result.total),
            page: Some(page),
            pages: Some(pages),
            ..Self::list(result.products)
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self::empty(true).with_message(message)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::empty(false).with_message(message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_absent_fields_are_omitted() {
        let body = serde_json::to_value(ApiResponse::ok(42)).unwrap();
        assert_eq!(body, json!({ "success": true, "data": 42 }));

        let body = serde_json::to_value(ApiResponse::<()>::failure("Cart is empty")).unwrap();
        assert_eq!(body, json!({ "success": false, "message": "Cart is empty" }));
    }

    #[test]
    fn test_list_carries_count() {
        let body = serde_json::to_value(ApiResponse::list(vec!["a", "b"])).unwrap();
        assert_eq!(body, json!({ "success": true, "data": ["a", "b"], "count": 2 }));
    }

    #[test]
    fn test_page_counts_partial_pages() {
        let result = ProductPage {
            products: vec![],
            total: 25,
        };
        let body = ApiResponse::page(result, 3, 12);
        assert_eq!(body.pages, Some(3));
        assert_eq!(body.page, Some(3));
        assert_eq!(body.count, Some(0));
    }
}
