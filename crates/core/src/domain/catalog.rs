use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One catalog item surfaced by a product search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductHit {
    pub id: u64,
    pub title: String,
    pub price: f64,
    pub category: String,
}

/// Outcome of a product search: the original query plus up to five matching
/// items in the catalog service's own ordering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductSearch {
    pub query: String,
    pub results: Vec<ProductHit>,
}

/// Outcome of an order lookup. The cart payload is carried verbatim as the
/// catalog service returned it and is present iff the order was found.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLookup {
    pub order_id: u64,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart: Option<Value>,
}

impl OrderLookup {
    pub fn missing(order_id: u64) -> Self {
        Self { order_id, found: false, cart: None }
    }

    pub fn found(order_id: u64, cart: Value) -> Self {
        Self { order_id, found: true, cart: Some(cart) }
    }
}

/// Structured outcome of the single optional tool call a request may make.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResult {
    ProductSearch(ProductSearch),
    OrderLookup(OrderLookup),
}
