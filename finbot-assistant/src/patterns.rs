//! Regex cascade that recognises transaction and query messages.
//!
//! Patterns are evaluated in a fixed order (Expense, Income, BalanceQuery,
//! StatementQuery) and the first one that matches wins, regardless of where
//! in the message the match sits.

use anyhow::{Context, Result};
use finbot_core::TransactionType;
use regex::Regex;

/// Amount token: "50", "50,00", "50.5". No thousand separators.
const AMOUNT: &str = r"(\d+(?:[.,]\d{1,2})?)";

/// Anything above this is a typo or an overflow, not a household transaction.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Expense,
    Income,
    BalanceQuery,
    StatementQuery,
}

impl MatchKind {
    pub fn transaction_type(&self) -> Option<TransactionType> {
        match self {
            MatchKind::Expense => Some(TransactionType::Expense),
            MatchKind::Income => Some(TransactionType::Income),
            MatchKind::BalanceQuery | MatchKind::StatementQuery => None,
        }
    }
}

/// What a pattern pulled out of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatch {
    pub kind: MatchKind,
    pub amount: Option<f64>,
    /// Trimmed remainder after verb, amount and preposition; may be empty.
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
struct PatternDef {
    kind: MatchKind,
    regex: Regex,
}

impl PatternDef {
    fn new(kind: MatchKind, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).with_context(|| format!("compile {kind:?} pattern"))?;
        Ok(Self { kind, regex })
    }

    fn apply(&self, message: &str) -> Option<RawMatch> {
        let caps = self.regex.captures(message)?;
        if self.kind.transaction_type().is_none() {
            return Some(RawMatch {
                kind: self.kind,
                amount: None,
                context: None,
            });
        }

        let token = caps.get(1)?;
        // "50.000" or "1.234,56": the token stopped inside a longer number
        if continues_number(&message[token.end()..]) {
            return None;
        }
        let amount = parse_amount(token.as_str())?;
        let context = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        Some(RawMatch {
            kind: self.kind,
            amount: Some(amount),
            context: Some(context),
        })
    }
}

fn transaction_pattern(verbs: &str, prepositions: &str) -> String {
    format!(
        r"(?is)\b(?:{verbs})\b\s*(?:de\s+)?(?:r\$\s*)?{AMOUNT}\s*(?:(?:reais|real)\b)?\s*(?:(?:{prepositions})\b)?(.*)$"
    )
}

fn continues_number(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.' | ',') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Parse an amount token, accepting a comma decimal separator.
/// Non-finite, non-positive or absurdly large values are rejected.
pub fn parse_amount(token: &str) -> Option<f64> {
    let value: f64 = token.trim().replace(',', ".").parse().ok()?;
    (value.is_finite() && value > 0.0 && value <= MAX_AMOUNT).then_some(value)
}

#[derive(Debug, Clone)]
pub struct PatternExtractor {
    patterns: Vec<PatternDef>,
    hints: Vec<(Regex, TransactionType)>,
}

impl PatternExtractor {
    pub fn new() -> Result<Self> {
        let patterns = vec![
            PatternDef::new(
                MatchKind::Expense,
                &transaction_pattern(
                    "gastei|comprei|paguei|despesa|gasto",
                    "com|no|na|em|de|para|pro",
                ),
            )?,
            PatternDef::new(
                MatchKind::Income,
                &transaction_pattern("recebi|ganhei|salário|renda|entrada", "do|da|de|em"),
            )?,
            PatternDef::new(
                MatchKind::BalanceQuery,
                r"(?i)\b(?:(?:qual|meu|ver|consultar)\s+(?:é\s+)?(?:o\s+)?(?:meu\s+)?)?(?:saldo|dinheiro)\b",
            )?,
            PatternDef::new(
                MatchKind::StatementQuery,
                r"(?is)\bextrato\b|\b(?:gastos?|quanto)\b.*\b(?:mês|mes|semana|hoje|ontem)\b",
            )?,
        ];

        let hints = vec![
            (
                Regex::new(r"(?i)\b(?:gastei|comprei|paguei)\b").context("compile expense hint")?,
                TransactionType::Expense,
            ),
            (
                Regex::new(r"(?i)\b(?:recebi|ganhei)\b").context("compile income hint")?,
                TransactionType::Income,
            ),
        ];

        Ok(Self { patterns, hints })
    }

    /// Evaluation order of the cascade.
    pub fn order(&self) -> Vec<MatchKind> {
        self.patterns.iter().map(|p| p.kind).collect()
    }

    /// Run the cascade; first successful pattern wins.
    pub fn extract(&self, message: &str) -> Option<RawMatch> {
        self.patterns.iter().find_map(|p| p.apply(message))
    }

    /// A past-tense transaction verb with no usable amount ("gastei com mercado").
    pub fn transaction_hint(&self, message: &str) -> Option<TransactionType> {
        self.hints
            .iter()
            .find(|(re, _)| re.is_match(message))
            .map(|(_, kind)| *kind)
    }
}
