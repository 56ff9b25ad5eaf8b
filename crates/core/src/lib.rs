pub mod config;
pub mod domain;

pub use domain::catalog::{OrderLookup, ProductHit, ProductSearch, ToolResult};
pub use domain::chat::{ChatResponse, Intent, Message, Role};
