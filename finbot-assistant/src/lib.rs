//! finbot-assistant: natural-language command interpreter, category rules,
//! conversational fallback, query reports and the chat/messaging channels

pub mod category_rules;
pub mod command;
pub mod fallback;
pub mod insights;
pub mod interpreter;
pub mod messaging;
pub mod oracle;
pub mod patterns;
pub mod query;
pub mod service;

pub use category_rules::classify;
pub use command::{Action, Command, QueryType, TransactionDraft};
pub use fallback::fallback;
pub use interpreter::Interpreter;
pub use messaging::MessagingGateway;
pub use oracle::{IntentOracle, IntentSignal, NoopOracle};
pub use patterns::{MatchKind, PatternExtractor, RawMatch};
pub use query::respond;
pub use service::{Channel, ChatReply, ChatService};
