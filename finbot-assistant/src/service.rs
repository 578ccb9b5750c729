//! Chat endpoint contract: one message in, one reply out.
//!
//! This is the caller side of the interpreter. It builds the financial
//! snapshot, persists transactions, turns storage failures into an apology
//! that still shows what was understood, and renders query reports.

use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use finbot_core::time::{format_date_br, today_in};
use finbot_core::{
    Storage, Transaction, UserFinancialContext, UserId, UserSummary, format_brl,
};
use serde::Serialize;
use std::sync::Arc;

use crate::command::{Action, Command, TransactionDraft};
use crate::interpreter::Interpreter;
use crate::oracle::{IntentOracle, NoopOracle};
use crate::query::respond;

/// Where the reply is going; only changes emphasis and sign-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Web,
    Messaging,
}

impl Channel {
    fn bold(&self, text: &str) -> String {
        match self {
            Channel::Web => format!("**{text}**"),
            Channel::Messaging => format!("*{text}*"),
        }
    }

    fn recorded_title(&self) -> &'static str {
        match self {
            Channel::Web => "Transação registrada com sucesso!",
            Channel::Messaging => "Transação registrada via WhatsApp!",
        }
    }

    fn sign_off(&self) -> &'static str {
        match self {
            Channel::Web => {
                "🚀 Continue registrando suas transações para ter um controle completo das suas finanças!"
            }
            Channel::Messaging => {
                "🚀 Continue enviando comandos pelo WhatsApp para controlar suas finanças!"
            }
        }
    }

    fn retry_hint(&self) -> &'static str {
        match self {
            Channel::Web => {
                "💡 Você pode tentar novamente ou usar o botão \"Nova Transação\" no dashboard."
            }
            Channel::Messaging => "💡 Tente novamente ou acesse a plataforma web.",
        }
    }
}

/// JSON body returned by the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    pub transaction_created: Option<Transaction>,
    pub action: Action,
}

pub struct ChatService<S, O = NoopOracle> {
    storage: Arc<S>,
    interpreter: Interpreter<O>,
    channel: Channel,
}

impl<S: Storage, O: IntentOracle> ChatService<S, O> {
    pub fn new(storage: Arc<S>, interpreter: Interpreter<O>) -> Self {
        Self {
            storage,
            interpreter,
            channel: Channel::Web,
        }
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn interpreter(&self) -> &Interpreter<O> {
        &self.interpreter
    }

    /// Snapshot handed to the interpreter for one message.
    pub fn context_for(&self, user_id: UserId) -> Result<(UserFinancialContext, UserSummary)> {
        let user = self
            .storage
            .user(user_id)?
            .ok_or_else(|| anyhow!("unknown user {user_id}"))?;
        let summary = self.storage.user_summary(user_id)?;
        Ok((UserFinancialContext::new(&summary, user.name), summary))
    }

    /// Errors only for a blank message or a failed snapshot read; everything
    /// after interpretation is answered in natural language.
    pub fn handle(&self, user_id: UserId, message: &str) -> Result<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            bail!("message is required");
        }

        let (context, summary) = self.context_for(user_id)?;
        if let Err(e) = self.storage.touch_user(user_id, Utc::now()) {
            tracing::warn!(user_id, error = %e, "failed to record last access");
        }
        let transactions = self.storage.transactions_by_user(user_id)?;
        let today = today_in(self.interpreter.timezone());

        let command = self.interpreter.interpret_on(message, &context, today);
        let action = command.action();
        tracing::info!(user_id, action = action.as_str(), "message interpreted");

        let (response, transaction_created) = match command {
            Command::CreateTransaction { transaction, .. } => {
                self.record(user_id, &transaction, &summary)
            }
            Command::QueryData { query_type, .. } => {
                (respond(query_type, &context, &transactions, today), None)
            }
            Command::GeneralChat { chat_response } => (chat_response, None),
        };

        Ok(ChatReply {
            response,
            transaction_created,
            action,
        })
    }

    fn record(
        &self,
        user_id: UserId,
        draft: &TransactionDraft,
        before: &UserSummary,
    ) -> (String, Option<Transaction>) {
        if let Err(e) = draft.validate() {
            tracing::warn!(user_id, error = %e, "rejected transaction draft");
            return (
                "🤔 Não consegui entender o valor da transação. Informe um valor maior que zero, \
por exemplo: \"gastei 50 reais com mercado\"."
                    .to_string(),
                None,
            );
        }

        match self.storage.create_transaction(user_id, &draft.to_new_transaction()) {
            Ok(created) => {
                tracing::info!(
                    user_id,
                    transaction_id = created.id,
                    amount = created.amount,
                    category = %created.category,
                    "transaction recorded"
                );
                let balance = self
                    .storage
                    .user_summary(user_id)
                    .map(|s| s.balance)
                    .unwrap_or(before.balance + created.signed_amount());
                (self.confirmation(draft, balance), Some(created))
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "failed to record transaction");
                (self.apology(draft), None)
            }
        }
    }

    fn confirmation(&self, draft: &TransactionDraft, balance: f64) -> String {
        format!(
            "✅ {}\n\n\
💰 {}: {}\n\
📝 Descrição: {}\n\
🏷️ Categoria: {}\n\
📅 Data: {}\n\n\
💳 {} {}\n\n\
{}",
            self.channel.bold(self.channel.recorded_title()),
            draft.kind.label(),
            format_brl(draft.amount),
            draft.description,
            draft.category,
            format_date_br(draft.date),
            self.channel.bold("Saldo atualizado:"),
            format_brl(balance),
            self.channel.sign_off()
        )
    }

    fn apology(&self, draft: &TransactionDraft) -> String {
        format!(
            "❌ {}\n\n\
Mas entendi que você quer registrar:\n\
• {} de {}\n\
• Descrição: {}\n\
• Categoria: {}\n\n\
{}",
            self.channel.bold("Ops! Não consegui registrar a transação."),
            draft.kind.label(),
            format_brl(draft.amount),
            draft.description,
            draft.category,
            self.channel.retry_hint()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finbot_core::{MemStorage, NewTransaction, User};

    /// Storage whose writes always fail.
    struct ReadOnly(MemStorage);

    impl Storage for ReadOnly {
        fn user(&self, id: UserId) -> Result<Option<User>> {
            self.0.user(id)
        }
        fn create_user(&self, name: &str, email: &str) -> Result<User> {
            self.0.create_user(name, email)
        }
        fn users(&self) -> Result<Vec<User>> {
            self.0.users()
        }
        fn touch_user(&self, _: UserId, _: chrono::DateTime<Utc>) -> Result<()> {
            bail!("database is read-only")
        }
        fn transactions_by_user(&self, user_id: UserId) -> Result<Vec<Transaction>> {
            self.0.transactions_by_user(user_id)
        }
        fn create_transaction(&self, _: UserId, _: &NewTransaction) -> Result<Transaction> {
            bail!("database is read-only")
        }
        fn link_phone(&self, phone: &str, user_id: UserId) -> Result<()> {
            self.0.link_phone(phone, user_id)
        }
        fn user_by_phone(&self, phone: &str) -> Result<Option<UserId>> {
            self.0.user_by_phone(phone)
        }
    }

    fn service() -> (ChatService<MemStorage>, UserId) {
        let store = Arc::new(MemStorage::new());
        let user = store.create_user("Ana", "ana@example.com").unwrap();
        (
            ChatService::new(store, Interpreter::deterministic().unwrap()),
            user.id,
        )
    }

    #[test]
    fn test_transaction_is_persisted_and_confirmed() {
        let (svc, uid) = service();
        let reply = svc.handle(uid, "gastei 50 reais com mercado").unwrap();
        assert_eq!(reply.action, Action::CreateTransaction);
        let created = reply.transaction_created.unwrap();
        assert_eq!(created.amount, 50.0);
        assert!(reply.response.contains("**Transação registrada com sucesso!**"));
        assert!(reply.response.contains("Saldo atualizado:** -R$ 50,00"));
        assert_eq!(svc.storage().transactions_by_user(uid).unwrap().len(), 1);
    }

    #[test]
    fn test_persistence_failure_becomes_apology() {
        let store = Arc::new(ReadOnly(MemStorage::new()));
        let user = store.create_user("Ana", "ana@example.com").unwrap();
        let svc = ChatService::new(store, Interpreter::deterministic().unwrap());

        let reply = svc.handle(user.id, "gastei 30 com uber").unwrap();
        assert_eq!(reply.action, Action::CreateTransaction);
        assert!(reply.transaction_created.is_none());
        assert!(reply.response.contains("Não consegui registrar"));
        assert!(reply.response.contains("Despesa de R$ 30,00"));
        assert!(reply.response.contains("Descrição: uber"));
        assert!(reply.response.contains("Categoria: Transporte"));
        assert!(reply.response.contains("Nova Transação"));
    }

    #[test]
    fn test_messaging_channel_formatting() {
        let (svc, uid) = service();
        let svc = svc.with_channel(Channel::Messaging);
        let reply = svc.handle(uid, "recebi 1200 do salário").unwrap();
        assert!(reply.response.contains("*Transação registrada via WhatsApp!*"));
        assert!(!reply.response.contains("**"));
    }

    #[test]
    fn test_query_uses_fresh_aggregates() {
        let (svc, uid) = service();
        svc.handle(uid, "recebi 400 do salário").unwrap();
        svc.handle(uid, "gastei 50 com pizza").unwrap();
        let reply = svc.handle(uid, "qual meu saldo?").unwrap();
        assert_eq!(reply.action, Action::QueryData);
        assert!(reply.response.contains("R$ 350,00"));
        assert!(reply.transaction_created.is_none());
    }

    #[test]
    fn test_handle_records_last_access() {
        let (svc, uid) = service();
        let before = Utc::now();
        svc.handle(uid, "oi").unwrap();
        let seen = svc.storage().user(uid).unwrap().unwrap().last_access.unwrap();
        assert!(seen >= before);
    }

    #[test]
    fn test_blank_and_unknown_user_are_errors() {
        let (svc, uid) = service();
        assert!(svc.handle(uid, "   ").is_err());
        assert!(svc.handle(uid + 100, "oi").is_err());
    }

    #[test]
    fn test_reply_wire_shape() {
        let (svc, uid) = service();
        let v = serde_json::to_value(svc.handle(uid, "oi").unwrap()).unwrap();
        assert_eq!(v["action"], "general_chat");
        assert!(v["transactionCreated"].is_null());
        assert!(v["response"].is_string());
    }
}
