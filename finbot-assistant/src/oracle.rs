//! Optional second opinion from a language model.
//!
//! The interpreter only consults an oracle when the regex cascade found
//! nothing. Implementations own their timeout and must turn every failure
//! into `None`.

use finbot_core::{Category, TransactionType};
use serde::Deserialize;

use crate::command::QueryType;

/// What an oracle believes the user meant.
#[derive(Debug, Clone, PartialEq)]
pub enum IntentSignal {
    Transaction {
        kind: TransactionType,
        amount: Option<f64>,
        description: Option<String>,
        category: Option<Category>,
    },
    Query(QueryType),
    Chat,
}

pub trait IntentOracle: Send + Sync {
    fn classify_intent(&self, text: &str) -> Option<IntentSignal>;
}

/// Oracle that never has an opinion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOracle;

impl IntentOracle for NoopOracle {
    fn classify_intent(&self, _text: &str) -> Option<IntentSignal> {
        None
    }
}

impl<T: IntentOracle + ?Sized> IntentOracle for Box<T> {
    fn classify_intent(&self, text: &str) -> Option<IntentSignal> {
        (**self).classify_intent(text)
    }
}

/// Instructions for a model answering in the JSON shape read by [`parse_signal`].
pub const CLASSIFIER_PROMPT: &str = r#"Você é o FinBot, um assistente financeiro que interpreta comandos do usuário.

REGRAS:
1. GASTO/DESPESA/COMPRA: action = "create_transaction", type = "expense"
2. RECEBI/GANHO/RENDA: action = "create_transaction", type = "income"
3. SALDO/EXTRATO/QUANTO GASTEI: action = "query_data"
4. Caso contrário: action = "general_chat"

CATEGORIAS VÁLIDAS: Alimentação, Transporte, Casa, Saúde, Educação, Lazer, Compras, Trabalho, Outros

Responda somente JSON:
{
  "action": "create_transaction" | "query_data" | "general_chat",
  "transactionData": {"type": "income" | "expense", "amount": número ou null, "description": "texto", "category": "categoria"},
  "queryType": "balance" | "expenses" | "period" | "generic"
}"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelReply {
    action: Option<String>,
    transaction_data: Option<ModelTransaction>,
    query_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelTransaction {
    #[serde(rename = "type")]
    kind: Option<String>,
    amount: Option<serde_json::Value>,
    description: Option<String>,
    category: Option<String>,
}

/// Read a model's JSON reply. Anything unreadable is no signal.
pub fn parse_signal(raw: &str) -> Option<IntentSignal> {
    let body = strip_code_fence(raw);
    let reply: ModelReply = serde_json::from_str(body).ok()?;

    match reply.action.as_deref()? {
        "create_transaction" => {
            let data = reply.transaction_data?;
            let kind = match data.kind.as_deref()? {
                "income" => TransactionType::Income,
                "expense" => TransactionType::Expense,
                _ => return None,
            };
            let amount = data.amount.as_ref().and_then(amount_from_json);
            Some(IntentSignal::Transaction {
                kind,
                amount,
                description: data
                    .description
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
                category: data.category.as_deref().map(Category::from_name),
            })
        }
        "query_data" => Some(IntentSignal::Query(
            reply
                .query_type
                .as_deref()
                .map(QueryType::from_name)
                .unwrap_or(QueryType::Generic),
        )),
        "general_chat" => Some(IntentSignal::Chat),
        _ => None,
    }
}

fn amount_from_json(v: &serde_json::Value) -> Option<f64> {
    let value = match v {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => crate::patterns::parse_amount(s)?,
        _ => return None,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

fn strip_code_fence(raw: &str) -> &str {
    let t = raw.trim();
    let Some(inner) = t.strip_prefix("```") else {
        return t;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_has_no_opinion() {
        assert_eq!(NoopOracle.classify_intent("gastei 10"), None);
    }

    #[test]
    fn test_parse_transaction() {
        let raw = r#"{"action":"create_transaction","transactionData":{"type":"expense","amount":50,"description":"Mercado","category":"Alimentação"}}"#;
        assert_eq!(
            parse_signal(raw),
            Some(IntentSignal::Transaction {
                kind: TransactionType::Expense,
                amount: Some(50.0),
                description: Some("Mercado".to_string()),
                category: Some(Category::Alimentacao),
            })
        );
    }

    #[test]
    fn test_parse_amount_as_string_and_missing() {
        let raw = r#"{"action":"create_transaction","transactionData":{"type":"income","amount":"1200,00"}}"#;
        match parse_signal(raw) {
            Some(IntentSignal::Transaction { amount, .. }) => assert_eq!(amount, Some(1200.0)),
            other => panic!("unexpected {other:?}"),
        }

        let raw = r#"{"action":"create_transaction","transactionData":{"type":"expense","amount":null}}"#;
        match parse_signal(raw) {
            Some(IntentSignal::Transaction { amount, .. }) => assert_eq!(amount, None),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_query_and_chat() {
        assert_eq!(
            parse_signal(r#"{"action":"query_data","queryType":"period"}"#),
            Some(IntentSignal::Query(QueryType::Period))
        );
        assert_eq!(
            parse_signal("```json\n{\"action\":\"query_data\"}\n```"),
            Some(IntentSignal::Query(QueryType::Generic))
        );
        assert_eq!(parse_signal(r#"{"action":"general_chat"}"#), Some(IntentSignal::Chat));
    }

    #[test]
    fn test_garbage_is_no_signal() {
        assert_eq!(parse_signal("desculpe, não entendi"), None);
        assert_eq!(parse_signal(r#"{"action":"dance"}"#), None);
        assert_eq!(parse_signal(r#"{}"#), None);
        assert_eq!(
            parse_signal(r#"{"action":"create_transaction","transactionData":{"type":"gift"}}"#),
            None
        );
    }
}
