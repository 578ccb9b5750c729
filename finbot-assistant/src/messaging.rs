//! Plain-text messaging channel (WhatsApp-style).
//!
//! The transport hands us `(from, body)` per inbound message and sends back
//! whatever string we return. Senders are resolved through the phone links
//! kept in storage.

use anyhow::Result;
use finbot_core::{Storage, UserId};

use crate::oracle::{IntentOracle, NoopOracle};
use crate::service::{Channel, ChatService};

const USAGE: &str = "📱 Use comandos como:\n\
• \"gastei 50 reais com mercado\"\n\
• \"recebi 1200 do salário\"\n\
• \"qual meu saldo?\"";

pub struct MessagingGateway<S, O = NoopOracle> {
    service: ChatService<S, O>,
}

impl<S: Storage, O: IntentOracle> MessagingGateway<S, O> {
    pub fn new(service: ChatService<S, O>) -> Self {
        Self {
            service: service.with_channel(Channel::Messaging),
        }
    }

    pub fn link(&self, phone: &str, user_id: UserId) -> Result<()> {
        self.service.storage().link_phone(phone, user_id)?;
        tracing::info!(user_id, "phone linked");
        Ok(())
    }

    /// Text to send back, or `None` when there is nothing to answer.
    pub fn process_inbound(&self, from: &str, body: &str) -> Option<String> {
        if body.trim().is_empty() {
            return None;
        }
        tracing::info!(from, "inbound message");

        let user_id = match self.service.storage().user_by_phone(from) {
            Ok(Some(id)) => id,
            Ok(None) => return Some(unlinked_reply()),
            Err(e) => {
                tracing::error!(from, error = %e, "phone lookup failed");
                return Some(error_reply());
            }
        };

        match self.service.handle(user_id, body) {
            Ok(reply) => Some(reply.response),
            Err(e) => {
                tracing::error!(from, user_id, error = %e, "failed to process message");
                Some(error_reply())
            }
        }
    }
}

fn unlinked_reply() -> String {
    format!(
        "👋 Olá! Para usar o FinBot por aqui, primeiro entre na plataforma web e vincule seu número.\n\n\
Depois disso você pode mandar mensagens como estas.\n\n{USAGE}"
    )
}

fn error_reply() -> String {
    format!("❌ Ops! Ocorreu um erro ao processar sua mensagem. Tente novamente.\n\n{USAGE}")
}
