//! # Response Formatting
//!
//! Standard response types for API handlers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a list request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    pub feed: Vec<Value>,
    /// Page number; `None` when resuming from a cursor
    pub page: Option<usize>,
    pub pagesize: usize,
    pub pagecount: usize,
    pub items_total: usize,
    pub items_on_page: usize,
    /// Resume position, present while more results remain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    /// Relative URL of the next page, present while more results remain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

impl ListResponse {
    pub fn new(feed: Vec<Value>, page: Option<usize>, pagesize: usize, items_total: usize) -> Self {
        let items_on_page = feed.len();
        Self {
            feed,
            page,
            pagesize,
            pagecount: items_total.div_ceil(pagesize.max(1)),
            items_total,
            items_on_page,
            cursor: None,
            next_page: None,
        }
    }

    /// Override the page count computed from the total
    pub fn with_pagecount(mut self, pagecount: usize) -> Self {
        self.pagecount = pagecount;
        self
    }

    pub fn with_next(mut self, cursor: String, next_page: String) -> Self {
        self.cursor = Some(cursor);
        self.next_page = Some(next_page);
        self
    }
}

/// Delete response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "200 OK".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_response_serialization() {
        let response = ListResponse::new(vec![json!({"id": 1}), json!({"id": 2})], Some(1), 20, 45);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["items_on_page"], 2);
        assert_eq!(json["pagecount"], 3);
        assert_eq!(json["page"], 1);
        assert!(json.get("cursor").is_none());
        assert!(json.get("next_page").is_none());
    }

    #[test]
    fn test_resumed_page_has_null_page() {
        let response = ListResponse::new(Vec::new(), None, 10, 0)
            .with_next("c".to_string(), "/p?cursor=c".to_string());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["page"].is_null());
        assert_eq!(json["pagecount"], 0);
        assert_eq!(json["cursor"], "c");
    }

    #[test]
    fn test_status_response() {
        let json = serde_json::to_value(StatusResponse::ok()).unwrap();
        assert_eq!(json, json!({"status": "200 OK"}));
    }
}
