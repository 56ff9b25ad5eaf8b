use shopmate_core::{Intent, Message, ToolResult};

pub const SYSTEM_PROMPT: &str = "You are Shopmate, a friendly support assistant for an online \
store. You help customers find products and check on their orders. Keep answers short, accurate \
and polite.";

/// Substituted when a request arrives without a trailing human message.
pub const FALLBACK_GREETING: &str = "Hello";

/// Queried when an order-intent message carries no digits at all. Looking up
/// order 1 for "track my stuff" is inherited behavior; it can return someone
/// else's cart, so the lookup result should not be treated as authoritative.
pub const DEFAULT_ORDER_ID: u64 = 1;

/// Per-request workflow value: the transcript plus whatever the classify and
/// tool stages have produced so far. Never outlives its request.
#[derive(Debug, Default)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub intent: Option<Intent>,
    pub tool_result: Option<ToolResult>,
}

impl ConversationState {
    pub fn opening(user_text: &str) -> Self {
        Self { messages: vec![Message::human(user_text)], intent: None, tool_result: None }
    }

    /// Guarantees the transcript ends with a human message (substituting the
    /// fallback greeting otherwise) and prepends the system instruction.
    pub fn normalize(&mut self) {
        let ends_with_human = self.messages.last().is_some_and(Message::is_human);
        if !ends_with_human {
            self.messages.push(Message::human(FALLBACK_GREETING));
        }
        self.messages.insert(0, Message::system(SYSTEM_PROMPT));
    }

    /// Most recent human message, the one the classify and tool stages act on.
    pub fn latest_human_text(&self) -> Option<&str> {
        self.messages.iter().rev().find(|message| message.is_human()).map(|m| m.content.as_str())
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

pub fn classification_prompt(text: &str) -> String {
    format!(
        "Classify the customer message into exactly one of these labels: product, order, \
smalltalk. Reply with the label only, nothing else.\n\nMessage: {text}"
    )
}

/// First maximal run of decimal digits anywhere in the text, if any.
pub fn extract_order_id(text: &str) -> Option<u64> {
    let digits: String =
        text.chars().skip_while(|ch| !ch.is_ascii_digit()).take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Context line handed to the respond stage: the tool outcome rendered as
/// compact JSON, or a generic clarification request when no tool ran.
pub fn context_summary(tool_result: Option<&ToolResult>) -> String {
    match tool_result {
        Some(result) => {
            let rendered = serde_json::to_string(result).unwrap_or_default();
            format!("Here is what I found: {rendered}")
        }
        None => "Let me help with that. Can you share more details?".to_string(),
    }
}

pub fn respond_prompt(user_text: &str, summary: &str) -> String {
    format!("User: {user_text}\nContext: {summary}\nReply in 2-3 sentences.")
}
