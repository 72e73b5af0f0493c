pub mod coupon;
pub mod coupon_usage;
pub mod gift_card;
pub mod gift_card_transaction;
pub mod in_app_notification;
pub mod order;
pub mod order_item;
pub mod order_status_history;
pub mod product;
pub mod product_variation;
pub mod user;

use sea_orm::prelude::Json;
use serde::Serialize;
use uuid::Uuid;

/// Reads a JSON array of UUID strings, skipping malformed entries.
pub(crate) fn uuid_list(value: &Json) -> Vec<Uuid> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().and_then(|s| Uuid::parse_str(s).ok()))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn string_list(value: &Json) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn json_list<T: Serialize>(items: &[T]) -> Json {
    serde_json::to_value(items).unwrap_or_else(|_| Json::Array(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_helpers_tolerate_bad_shapes() {
        let id = Uuid::new_v4();
        assert_eq!(uuid_list(&json!([id, "nope", 3])), vec![id]);
        assert!(uuid_list(&json!({"a": 1})).is_empty());
        assert_eq!(string_list(&json!(["a", 1, "b"])), vec!["a", "b"]);
        assert_eq!(json_list(&["x", "y"]), json!(["x", "y"]));
    }
}
