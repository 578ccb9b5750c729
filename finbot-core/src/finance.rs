//! Finance record types: transactions, categories and per-user aggregates

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::{local_date, same_month};

/// Storage-assigned user identifier.
pub type UserId = u64;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionType {
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "expense")]
    Expense,
}

impl TransactionType {
    /// Wire name used by the chat endpoint and the ledger file
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Label shown to the user ("Receita" / "Despesa")
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Income => "Receita",
            TransactionType::Expense => "Despesa",
        }
    }
}

/// Closed category set shared by the assistant and the manual entry form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    #[serde(rename = "Alimentação")]
    Alimentacao,
    #[serde(rename = "Transporte")]
    Transporte,
    #[serde(rename = "Casa")]
    Casa,
    #[serde(rename = "Saúde")]
    Saude,
    #[serde(rename = "Educação")]
    Educacao,
    #[serde(rename = "Lazer")]
    Lazer,
    #[serde(rename = "Compras")]
    Compras,
    #[serde(rename = "Trabalho")]
    Trabalho,
    #[serde(rename = "Outros")]
    Outros,
}

impl Category {
    /// Every category, in form display order
    pub const ALL: [Category; 9] = [
        Category::Alimentacao,
        Category::Transporte,
        Category::Casa,
        Category::Saude,
        Category::Educacao,
        Category::Lazer,
        Category::Compras,
        Category::Trabalho,
        Category::Outros,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Alimentacao => "Alimentação",
            Category::Transporte => "Transporte",
            Category::Casa => "Casa",
            Category::Saude => "Saúde",
            Category::Educacao => "Educação",
            Category::Lazer => "Lazer",
            Category::Compras => "Compras",
            Category::Trabalho => "Trabalho",
            Category::Outros => "Outros",
        }
    }

    /// Lenient lookup for names coming from outside (model output, CSV, forms).
    /// Case-insensitive, accepts unaccented spellings; unknown names map to `Outros`.
    pub fn from_name(name: &str) -> Category {
        let wanted = fold_accents(name.trim());
        Category::ALL
            .into_iter()
            .find(|c| fold_accents(c.name()) == wanted)
            .unwrap_or(Category::Outros)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn fold_accents(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    /// Last time the user sent a message
    #[serde(default)]
    pub last_access: Option<DateTime<Utc>>,
}

/// Insert shape for a transaction; the storage assigns id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    /// Always positive; direction lives in `kind`
    pub amount: f64,
    pub category: Category,
    pub date: NaiveDate,
}

/// A persisted transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: u64,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    pub amount: f64,
    pub category: Category,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    /// Amount with sign applied (expenses negative)
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// Per-user aggregates as reported by storage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub balance: f64,
    pub transaction_count: usize,
}

impl UserSummary {
    /// Aggregate a user's transactions
    pub fn from_transactions(txns: &[Transaction]) -> Self {
        let total_income: f64 = txns.iter().filter(|t| t.is_income()).map(|t| t.amount).sum();
        let total_expenses: f64 = txns.iter().filter(|t| t.is_expense()).map(|t| t.amount).sum();
        Self {
            total_income,
            total_expenses,
            balance: total_income - total_expenses,
            transaction_count: txns.len(),
        }
    }
}

/// Users with activity inside this window count as retained.
const RETENTION_DAYS: i64 = 30;

/// Aggregate user statistics for the admin view
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: usize,
    pub active_today: usize,
    pub new_this_month: usize,
    /// Whole percent of users seen in the last 30 days
    pub retention_rate: u32,
}

pub fn admin_stats(users: &[User], today: NaiveDate, tz: Tz) -> AdminStats {
    let seen_on = |u: &User| u.last_access.map(|at| local_date(at, tz));
    let active_today = users.iter().filter(|u| seen_on(u) == Some(today)).count();
    let new_this_month = users
        .iter()
        .filter(|u| same_month(local_date(u.created_at, tz), today))
        .count();
    let cutoff = today - Duration::days(RETENTION_DAYS);
    let retained = users
        .iter()
        .filter(|u| seen_on(u).is_some_and(|d| d > cutoff))
        .count();
    let retention_rate = if users.is_empty() {
        0
    } else {
        ((retained as f64 * 100.0) / users.len() as f64).round() as u32
    };

    AdminStats {
        total_users: users.len(),
        active_today,
        new_this_month,
        retention_rate,
    }
}

/// Read-only snapshot handed to the assistant for one message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserFinancialContext {
    pub balance: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub display_name: String,
    pub transaction_count: usize,
}

impl UserFinancialContext {
    pub fn new(summary: &UserSummary, display_name: impl Into<String>) -> Self {
        Self {
            balance: summary.balance,
            total_income: summary.total_income,
            total_expenses: summary.total_expenses,
            display_name: display_name.into(),
            transaction_count: summary.transaction_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(id: UserId, created: DateTime<Utc>, last_access: Option<DateTime<Utc>>) -> User {
        User {
            id,
            name: format!("User {id}"),
            email: format!("u{id}@example.com"),
            created_at: created,
            last_access,
        }
    }

    #[test]
    fn test_admin_stats() {
        let tz = chrono_tz::America::Sao_Paulo;
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let at = |m, d, h| Utc.with_ymd_and_hms(2026, m, d, h, 0, 0).unwrap();
        let users = vec![
            user(1, at(1, 5, 12), Some(at(3, 15, 14))),
            // 01:00 UTC on the 16th is still the 15th in São Paulo
            user(2, at(3, 2, 12), Some(at(3, 16, 1))),
            user(3, at(3, 10, 12), Some(at(2, 20, 12))),
            user(4, at(1, 1, 12), Some(at(1, 2, 12))),
            user(5, at(3, 1, 12), None),
        ];
        let stats = admin_stats(&users, today, tz);
        assert_eq!(stats.total_users, 5);
        assert_eq!(stats.active_today, 2);
        assert_eq!(stats.new_this_month, 3);
        assert_eq!(stats.retention_rate, 60);
    }

    #[test]
    fn test_admin_stats_empty() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let stats = admin_stats(&[], today, chrono_tz::UTC);
        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.retention_rate, 0);
    }

    #[test]
    fn test_user_without_last_access_deserializes() {
        let json = r#"{"id":1,"name":"Ana","email":"a@x.com","created_at":"2026-03-01T12:00:00Z"}"#;
        let u: User = serde_json::from_str(json).unwrap();
        assert_eq!(u.last_access, None);
    }

    fn txn(id: u64, kind: TransactionType, amount: f64) -> Transaction {
        Transaction {
            id,
            user_id: 1,
            kind,
            description: "x".to_string(),
            amount,
            category: Category::Outros,
            date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_category_names_round_trip() {
        for c in Category::ALL {
            assert_eq!(Category::from_name(c.name()), c);
        }
        assert_eq!(Category::ALL.len(), 9);
    }

    #[test]
    fn test_category_from_name_is_lenient() {
        assert_eq!(Category::from_name("alimentacao"), Category::Alimentacao);
        assert_eq!(Category::from_name(" SAUDE "), Category::Saude);
        assert_eq!(Category::from_name("Viagem"), Category::Outros);
        assert_eq!(Category::from_name(""), Category::Outros);
    }

    #[test]
    fn test_category_serde_uses_display_names() {
        let json = serde_json::to_string(&Category::Alimentacao).unwrap();
        assert_eq!(json, "\"Alimentação\"");
        let back: Category = serde_json::from_str("\"Saúde\"").unwrap();
        assert_eq!(back, Category::Saude);
    }

    #[test]
    fn test_summary_from_transactions() {
        let txns = vec![
            txn(1, TransactionType::Income, 1200.0),
            txn(2, TransactionType::Expense, 50.0),
            txn(3, TransactionType::Expense, 30.5),
        ];
        let s = UserSummary::from_transactions(&txns);
        assert_eq!(s.total_income, 1200.0);
        assert_eq!(s.total_expenses, 80.5);
        assert_eq!(s.balance, 1119.5);
        assert_eq!(s.transaction_count, 3);
        assert_eq!(txns[1].signed_amount(), -50.0);
    }
}
