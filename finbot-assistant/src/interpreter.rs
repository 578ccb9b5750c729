//! Message → Command.
//!
//! Order of precedence:
//! 1) regex cascade (transactions, then balance/statement queries)
//! 2) optional oracle, only when the cascade found nothing
//! 3) clarification when a transaction verb came without an amount
//! 4) conversational fallback
//!
//! Never fails: the worst case is `GeneralChat`.

use anyhow::Result;
use chrono::NaiveDate;
use chrono_tz::Tz;
use finbot_core::time::today_in;
use finbot_core::{Category, TransactionType, UserFinancialContext, format_brl};

use crate::category_rules::classify;
use crate::command::{Command, QueryType, TransactionDraft};
use crate::fallback::fallback;
use crate::oracle::{IntentOracle, IntentSignal, NoopOracle};
use crate::patterns::{MatchKind, PatternExtractor};

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;

pub struct Interpreter<O = NoopOracle> {
    extractor: PatternExtractor,
    oracle: O,
    tz: Tz,
}

impl Interpreter<NoopOracle> {
    /// Regex + fallback only.
    pub fn deterministic() -> Result<Self> {
        Self::new(NoopOracle)
    }
}

impl<O: IntentOracle> Interpreter<O> {
    pub fn new(oracle: O) -> Result<Self> {
        Ok(Self {
            extractor: PatternExtractor::new()?,
            oracle,
            tz: DEFAULT_TIMEZONE,
        })
    }

    /// Timezone used to resolve "today" for transaction dates.
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.tz = tz;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn interpret(&self, message: &str, context: &UserFinancialContext) -> Command {
        self.interpret_on(message, context, today_in(self.tz))
    }

    /// Same as [`Interpreter::interpret`] with an explicit "today".
    pub fn interpret_on(
        &self,
        message: &str,
        context: &UserFinancialContext,
        today: NaiveDate,
    ) -> Command {
        if let Some(m) = self.extractor.extract(message) {
            tracing::debug!(kind = ?m.kind, amount = ?m.amount, "pattern matched");
            match m.kind {
                MatchKind::Expense | MatchKind::Income => {
                    if let (Some(kind), Some(amount)) = (m.kind.transaction_type(), m.amount) {
                        let text = m.context.unwrap_or_default();
                        let category = classify(&text, kind);
                        return create(kind, amount, &text, category, today);
                    }
                }
                MatchKind::BalanceQuery => return query(QueryType::Balance),
                MatchKind::StatementQuery => return query(QueryType::Period),
            }
        }

        match self.oracle.classify_intent(message) {
            Some(IntentSignal::Transaction {
                kind,
                amount: Some(amount),
                description,
                category,
            }) if amount.is_finite() && amount > 0.0 => {
                tracing::debug!(?kind, amount, "oracle recovered a transaction");
                let text = description.unwrap_or_default();
                let category = category.unwrap_or_else(|| classify(&text, kind));
                return create(kind, amount, &text, category, today);
            }
            Some(IntentSignal::Transaction { kind, .. }) => {
                tracing::debug!(?kind, "oracle saw a transaction without amount");
                return clarify(kind);
            }
            Some(IntentSignal::Query(query_type)) => return query(query_type),
            Some(IntentSignal::Chat) | None => {}
        }

        if let Some(kind) = self.extractor.transaction_hint(message) {
            return clarify(kind);
        }

        Command::GeneralChat {
            chat_response: fallback(message, Some(context)),
        }
    }
}

fn create(
    kind: TransactionType,
    amount: f64,
    context: &str,
    category: Category,
    date: NaiveDate,
) -> Command {
    let description = match context.trim() {
        "" => kind.label().to_string(),
        text => text.to_string(),
    };
    let chat_response = format!(
        "✅ Entendi! {} de {}\n📝 Descrição: {description}\n🏷️ Categoria: {category}",
        kind.label(),
        format_brl(amount)
    );
    Command::CreateTransaction {
        transaction: TransactionDraft {
            kind,
            amount,
            description,
            category,
            date,
        },
        chat_response,
    }
}

fn query(query_type: QueryType) -> Command {
    Command::QueryData {
        query_type,
        chat_response: "🔎 Consultando seus dados...".to_string(),
    }
}

fn clarify(kind: TransactionType) -> Command {
    let what = match kind {
        TransactionType::Expense => "uma despesa",
        TransactionType::Income => "uma receita",
    };
    Command::GeneralChat {
        chat_response: format!(
            "🤔 Entendi que você quer registrar {what}, mas não encontrei o valor.\n\n\
Tente assim:\n\
• \"gastei 50 reais com mercado\"\n\
• \"recebi 1200 do salário\""
        ),
    }
}
