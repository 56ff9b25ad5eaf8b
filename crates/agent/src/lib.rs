//! Conversation pipeline - intent classification and tool-backed replies
//!
//! This crate is the request-processing core of shopmate. One user message
//! flows through a fixed four-step chain:
//!
//! 1. **Normalize** (`conversation`) - rebuild the transcript with the system
//!    instruction and a guaranteed trailing human message
//! 2. **Classify** (`runtime` + `conversation`) - one LLM call mapping the
//!    message onto a closed intent set, degrading to `unknown`
//! 3. **Maybe-invoke-tool** (`tools`) - at most one catalog lookup, chosen by
//!    intent
//! 4. **Respond** (`runtime`) - one LLM call that turns the tool outcome (or
//!    a clarification request) into a short reply
//!
//! # Key Types
//!
//! - `AgentRuntime` - the orchestrator (see `runtime` module)
//! - `LlmClient` - pluggable completion seam; `GeminiClient` is the reqwest
//!   implementation
//! - `CatalogClient` - pluggable catalog seam; `HttpCatalogClient` talks to
//!   the external store API
//!
//! There is no state shared between requests: every run builds its own
//! `ConversationState` and discards it once the response is assembled.

pub mod conversation;
pub mod llm;
pub mod runtime;
pub mod tools;
