//! Interpreter output: what the user asked for, plus the text to show them.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use finbot_core::{Category, NewTransaction, TransactionType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "create_transaction")]
    CreateTransaction,
    #[serde(rename = "query_data")]
    QueryData,
    #[serde(rename = "general_chat")]
    GeneralChat,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateTransaction => "create_transaction",
            Action::QueryData => "query_data",
            Action::GeneralChat => "general_chat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    #[serde(rename = "balance")]
    Balance,
    #[serde(rename = "expenses")]
    Expenses,
    #[serde(rename = "period")]
    Period,
    #[serde(rename = "generic")]
    Generic,
}

impl QueryType {
    /// Map a query name from model output; unknown names become `Generic`.
    pub fn from_name(name: &str) -> QueryType {
        match name.trim().to_lowercase().as_str() {
            "balance" | "saldo" => QueryType::Balance,
            "expenses" | "gastos" => QueryType::Expenses,
            "period" | "extrato" => QueryType::Period,
            _ => QueryType::Generic,
        }
    }
}

/// Structured transaction extracted from a message, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub description: String,
    pub category: Category,
    pub date: NaiveDate,
}

impl TransactionDraft {
    /// Reject drafts that must never reach storage.
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            bail!("amount must be positive, got {}", self.amount);
        }
        if self.description.trim().is_empty() {
            bail!("description must not be empty");
        }
        Ok(())
    }

    pub fn to_new_transaction(&self) -> NewTransaction {
        NewTransaction {
            kind: self.kind,
            description: self.description.clone(),
            amount: self.amount,
            category: self.category,
            date: self.date,
        }
    }
}

/// One interpreted message. Built per message and dropped once answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTransaction {
        transaction: TransactionDraft,
        chat_response: String,
    },
    QueryData {
        query_type: QueryType,
        chat_response: String,
    },
    GeneralChat {
        chat_response: String,
    },
}

impl Command {
    pub fn action(&self) -> Action {
        match self {
            Command::CreateTransaction { .. } => Action::CreateTransaction,
            Command::QueryData { .. } => Action::QueryData,
            Command::GeneralChat { .. } => Action::GeneralChat,
        }
    }

    pub fn chat_response(&self) -> &str {
        match self {
            Command::CreateTransaction { chat_response, .. }
            | Command::QueryData { chat_response, .. }
            | Command::GeneralChat { chat_response } => chat_response,
        }
    }

    pub fn transaction(&self) -> Option<&TransactionDraft> {
        match self {
            Command::CreateTransaction { transaction, .. } => Some(transaction),
            _ => None,
        }
    }

    pub fn query_type(&self) -> Option<QueryType> {
        match self {
            Command::QueryData { query_type, .. } => Some(*query_type),
            _ => None,
        }
    }
}
