use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use tracing::debug;

use shopmate_core::{ChatResponse, Intent, Message, ToolResult};

use crate::conversation::{
    classification_prompt, context_summary, extract_order_id, respond_prompt, ConversationState,
    DEFAULT_ORDER_ID, SYSTEM_PROMPT,
};
use crate::llm::LlmClient;
use crate::tools::CatalogClient;

/// Orchestrates one request through normalize -> classify -> maybe-tool ->
/// respond. Both external integrations are injected so tests can substitute
/// fakes; the runtime itself holds no per-request state.
pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    catalog: Arc<dyn CatalogClient>,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, catalog: Arc<dyn CatalogClient>) -> Self {
        Self { llm, catalog }
    }

    /// Runs the full pipeline for one user message. LLM and catalog failures
    /// propagate unchanged; there are no retries and no partial responses.
    pub async fn run(&self, user_text: &str) -> Result<ChatResponse> {
        let mut state = ConversationState::opening(user_text);
        state.normalize();
        let human_text = state
            .latest_human_text()
            .context("normalized transcript has no human message")?
            .to_string();

        let raw_label =
            self.llm.complete(&[Message::human(classification_prompt(&human_text))]).await?;
        let intent = Intent::from_label(&raw_label);
        state.intent = Some(intent);
        debug!(event_name = "agent.intent_classified", intent = intent.as_str(), "intent classified");

        state.tool_result = match intent {
            Intent::Product => {
                let search = self.catalog.search_products(&human_text).await?;
                debug!(
                    event_name = "agent.product_search",
                    hits = search.results.len(),
                    "product search completed"
                );
                Some(ToolResult::ProductSearch(search))
            }
            Intent::Order => {
                let order_id = extract_order_id(&human_text).unwrap_or(DEFAULT_ORDER_ID);
                let lookup = self.catalog.lookup_order(order_id).await?;
                debug!(
                    event_name = "agent.order_lookup",
                    order_id,
                    found = lookup.found,
                    "order lookup completed"
                );
                Some(ToolResult::OrderLookup(lookup))
            }
            Intent::Smalltalk | Intent::Unknown => None,
        };

        let summary = context_summary(state.tool_result.as_ref());
        let reply = self
            .llm
            .complete(&[
                Message::system(SYSTEM_PROMPT),
                Message::human(respond_prompt(&human_text, &summary)),
            ])
            .await?;
        ensure!(!reply.trim().is_empty(), "model returned an empty reply");
        state.push(Message::assistant(reply.clone()));

        Ok(ChatResponse { intent: state.intent, tool_result: state.tool_result, answer: reply })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;

    use shopmate_core::{Intent, Message, OrderLookup, ProductHit, ProductSearch, ToolResult};

    use crate::llm::LlmClient;
    use crate::tools::CatalogClient;

    use super::AgentRuntime;

    /// Scripted completion client: pops one reply per call and records the
    /// prompts it was handed.
    #[derive(Default)]
    struct ScriptedLlm {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedLlm {
        fn with_replies(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, messages: &[Message]) -> Result<String> {
            self.prompts.lock().expect("prompts lock").push(messages.to_vec());
            self.replies
                .lock()
                .expect("replies lock")
                .pop_front()
                .ok_or_else(|| anyhow!("scripted llm ran out of replies"))
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    enum CatalogCall {
        Search(String),
        Lookup(u64),
    }

    #[derive(Default)]
    struct RecordingCatalog {
        calls: Mutex<Vec<CatalogCall>>,
        search_results: Vec<ProductHit>,
        order_found: bool,
        fail: bool,
    }

    impl RecordingCatalog {
        fn recorded(&self) -> Vec<CatalogCall> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl CatalogClient for RecordingCatalog {
        async fn search_products(&self, query: &str) -> Result<ProductSearch> {
            self.calls.lock().expect("calls lock").push(CatalogCall::Search(query.to_string()));
            if self.fail {
                return Err(anyhow!("catalog unavailable"));
            }
            Ok(ProductSearch { query: query.to_string(), results: self.search_results.clone() })
        }

        async fn lookup_order(&self, order_id: u64) -> Result<OrderLookup> {
            self.calls.lock().expect("calls lock").push(CatalogCall::Lookup(order_id));
            if self.fail {
                return Err(anyhow!("catalog unavailable"));
            }
            if self.order_found {
                Ok(OrderLookup::found(order_id, json!({"id": order_id, "products": []})))
            } else {
                Ok(OrderLookup::missing(order_id))
            }
        }
    }

    fn runtime(llm: Arc<ScriptedLlm>, catalog: Arc<RecordingCatalog>) -> AgentRuntime {
        AgentRuntime::new(llm, catalog)
    }

    #[tokio::test]
    async fn smalltalk_skips_the_catalog_entirely() {
        let llm = ScriptedLlm::with_replies(&["smalltalk", "Hi there! How can I help?"]);
        let catalog = Arc::new(RecordingCatalog::default());
        let response =
            runtime(llm.clone(), catalog.clone()).run("Hello").await.expect("pipeline run");

        assert_eq!(response.intent, Some(Intent::Smalltalk));
        assert!(response.tool_result.is_none());
        assert_eq!(response.answer, "Hi there! How can I help?");
        assert!(catalog.recorded().is_empty());
    }

    #[tokio::test]
    async fn unparseable_label_degrades_to_unknown_without_a_tool_call() {
        let llm = ScriptedLlm::with_replies(&["maybe a product?", "Could you tell me more?"]);
        let catalog = Arc::new(RecordingCatalog::default());
        let response =
            runtime(llm, catalog.clone()).run("ehh").await.expect("pipeline run");

        assert_eq!(response.intent, Some(Intent::Unknown));
        assert!(response.tool_result.is_none());
        assert!(catalog.recorded().is_empty());
    }

    #[tokio::test]
    async fn label_matching_ignores_case_and_whitespace() {
        let llm = ScriptedLlm::with_replies(&["  PRODUCT \n", "Found some options."]);
        let catalog = Arc::new(RecordingCatalog::default());
        let response =
            runtime(llm, catalog).run("any shirts?").await.expect("pipeline run");

        assert_eq!(response.intent, Some(Intent::Product));
    }

    #[tokio::test]
    async fn product_intent_searches_with_the_full_message_text() {
        let llm = ScriptedLlm::with_replies(&["product", "We have one red shirt in stock."]);
        let catalog = Arc::new(RecordingCatalog {
            search_results: vec![ProductHit {
                id: 1,
                title: "Red Shirt".to_string(),
                price: 22.3,
                category: "men's clothing".to_string(),
            }],
            ..RecordingCatalog::default()
        });
        let response = runtime(llm, catalog.clone())
            .run("find a red shirt")
            .await
            .expect("pipeline run");

        assert_eq!(catalog.recorded(), vec![CatalogCall::Search("find a red shirt".to_string())]);
        match response.tool_result {
            Some(ToolResult::ProductSearch(search)) => {
                assert_eq!(search.results[0].title, "Red Shirt");
            }
            other => panic!("expected a product search result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn order_intent_extracts_the_first_digit_run() {
        let llm = ScriptedLlm::with_replies(&["order", "Order 42 has not shipped yet."]);
        let catalog = Arc::new(RecordingCatalog { order_found: true, ..Default::default() });
        let response = runtime(llm, catalog.clone())
            .run("where is order 42")
            .await
            .expect("pipeline run");

        assert_eq!(catalog.recorded(), vec![CatalogCall::Lookup(42)]);
        assert_eq!(response.intent, Some(Intent::Order));
    }

    #[tokio::test]
    async fn order_intent_defaults_to_order_one_without_digits() {
        let llm = ScriptedLlm::with_replies(&["order", "I looked up your latest order."]);
        let catalog = Arc::new(RecordingCatalog { order_found: true, ..Default::default() });
        runtime(llm, catalog.clone()).run("track my stuff").await.expect("pipeline run");

        // Inherited quirk: no digits means cart 1 gets queried.
        assert_eq!(catalog.recorded(), vec![CatalogCall::Lookup(1)]);
    }

    #[tokio::test]
    async fn missing_order_surfaces_as_found_false() {
        let llm = ScriptedLlm::with_replies(&["order", "I could not find order 7."]);
        let catalog = Arc::new(RecordingCatalog::default());
        let response = runtime(llm, catalog)
            .run("where's order 7")
            .await
            .expect("pipeline run");

        match response.tool_result {
            Some(ToolResult::OrderLookup(lookup)) => {
                assert_eq!(lookup.order_id, 7);
                assert!(!lookup.found);
                assert!(lookup.cart.is_none());
            }
            other => panic!("expected an order lookup result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn respond_prompt_carries_the_tool_summary() {
        let llm = ScriptedLlm::with_replies(&["order", "Order 7 was not found."]);
        let catalog = Arc::new(RecordingCatalog::default());
        runtime(llm.clone(), catalog).run("where's order 7").await.expect("pipeline run");

        let prompts = llm.prompts.lock().expect("prompts lock");
        let respond_turn = &prompts[1];
        assert_eq!(respond_turn.len(), 2);
        assert!(respond_turn[1].content.contains("Here is what I found:"));
        assert!(respond_turn[1].content.contains("\"found\":false"));
        assert!(respond_turn[1].content.contains("Reply in 2-3 sentences."));
    }

    #[tokio::test]
    async fn catalog_failure_propagates_out_of_the_pipeline() {
        let llm = ScriptedLlm::with_replies(&["product", "unreachable"]);
        let catalog = Arc::new(RecordingCatalog { fail: true, ..Default::default() });

        let error = runtime(llm, catalog).run("find a shirt").await.expect_err("must fail");
        assert!(error.to_string().contains("catalog unavailable"));
    }

    #[tokio::test]
    async fn an_all_whitespace_reply_is_an_error() {
        let llm = ScriptedLlm::with_replies(&["smalltalk", "   \n"]);
        let catalog = Arc::new(RecordingCatalog::default());

        let error = runtime(llm, catalog).run("Hello").await.expect_err("must fail");
        assert!(error.to_string().contains("empty reply"));
    }
}
