//! Transaction persistence contract and the in-memory ledger behind it.
//!
//! The assistant never talks to a database directly: channels fetch a
//! summary through [`Storage`], hand the snapshot to the interpreter, and
//! write back through [`Storage::create_transaction`]. `MemStorage` keeps
//! everything behind one `RwLock` and can be snapshotted to a JSON file.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use crate::finance::{NewTransaction, Transaction, User, UserId, UserSummary};

pub trait Storage: Send + Sync {
    fn user(&self, id: UserId) -> Result<Option<User>>;

    fn create_user(&self, name: &str, email: &str) -> Result<User>;

    fn users(&self) -> Result<Vec<User>>;

    /// Record that the user was active at `at`.
    fn touch_user(&self, id: UserId, at: DateTime<Utc>) -> Result<()>;

    /// Newest first (by date, then by insertion).
    fn transactions_by_user(&self, user_id: UserId) -> Result<Vec<Transaction>>;

    fn create_transaction(&self, user_id: UserId, txn: &NewTransaction) -> Result<Transaction>;

    fn user_summary(&self, user_id: UserId) -> Result<UserSummary> {
        let txns = self.transactions_by_user(user_id)?;
        Ok(UserSummary::from_transactions(&txns))
    }

    /// Associate a messaging phone number with a user.
    fn link_phone(&self, phone: &str, user_id: UserId) -> Result<()>;

    fn user_by_phone(&self, phone: &str) -> Result<Option<UserId>>;
}

/// Serializable ledger contents
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub users: Vec<User>,
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub phone_links: BTreeMap<String, UserId>,
    pub next_user_id: u64,
    pub next_transaction_id: u64,
}

#[derive(Debug, Default)]
pub struct MemStorage {
    inner: RwLock<Ledger>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ledger(ledger: Ledger) -> Self {
        Self {
            inner: RwLock::new(ledger),
        }
    }

    /// Load a ledger file; a missing file yields an empty ledger.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let ledger: Ledger =
            serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(Self::from_ledger(ledger))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = {
            let ledger = self.read()?;
            serde_json::to_string_pretty(&*ledger)?
        };
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Ledger>> {
        self.inner
            .read()
            .map_err(|_| anyhow::anyhow!("ledger lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Ledger>> {
        self.inner
            .write()
            .map_err(|_| anyhow::anyhow!("ledger lock poisoned"))
    }
}

/// Keep only digits so "+55 11 99999-0000" and "5511999990000" collide.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

impl Storage for MemStorage {
    fn user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    fn create_user(&self, name: &str, email: &str) -> Result<User> {
        let name = name.trim();
        let email = email.trim().to_lowercase();
        if name.chars().count() < 2 {
            bail!("name must have at least 2 characters");
        }
        if !email.contains('@') {
            bail!("invalid email: {email}");
        }

        let mut ledger = self.write()?;
        if ledger.users.iter().any(|u| u.email == email) {
            bail!("email already registered: {email}");
        }
        ledger.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: ledger.next_user_id,
            name: name.to_string(),
            email,
            created_at: now,
            last_access: Some(now),
        };
        ledger.users.push(user.clone());
        Ok(user)
    }

    fn users(&self) -> Result<Vec<User>> {
        Ok(self.read()?.users.clone())
    }

    fn touch_user(&self, id: UserId, at: DateTime<Utc>) -> Result<()> {
        let mut ledger = self.write()?;
        let Some(user) = ledger.users.iter_mut().find(|u| u.id == id) else {
            bail!("unknown user {id}");
        };
        user.last_access = Some(at);
        Ok(())
    }

    fn transactions_by_user(&self, user_id: UserId) -> Result<Vec<Transaction>> {
        let mut txns: Vec<Transaction> = self
            .read()?
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        txns.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(txns)
    }

    fn create_transaction(&self, user_id: UserId, txn: &NewTransaction) -> Result<Transaction> {
        if !txn.amount.is_finite() || txn.amount <= 0.0 {
            bail!("amount must be a positive number, got {}", txn.amount);
        }
        if txn.description.trim().is_empty() {
            bail!("description must not be empty");
        }

        let mut ledger = self.write()?;
        if !ledger.users.iter().any(|u| u.id == user_id) {
            bail!("unknown user {user_id}");
        }
        ledger.next_transaction_id += 1;
        let created = Transaction {
            id: ledger.next_transaction_id,
            user_id,
            kind: txn.kind,
            description: txn.description.trim().to_string(),
            amount: txn.amount,
            category: txn.category,
            date: txn.date,
            created_at: Utc::now(),
        };
        ledger.transactions.push(created.clone());
        Ok(created)
    }

    fn link_phone(&self, phone: &str, user_id: UserId) -> Result<()> {
        let key = normalize_phone(phone);
        if key.is_empty() {
            bail!("phone number has no digits: {phone}");
        }
        let mut ledger = self.write()?;
        if !ledger.users.iter().any(|u| u.id == user_id) {
            bail!("unknown user {user_id}");
        }
        ledger.phone_links.insert(key, user_id);
        Ok(())
    }

    fn user_by_phone(&self, phone: &str) -> Result<Option<UserId>> {
        Ok(self.read()?.phone_links.get(&normalize_phone(phone)).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::{Category, TransactionType};
    use chrono::NaiveDate;

    fn new_txn(kind: TransactionType, amount: f64, day: u32) -> NewTransaction {
        NewTransaction {
            kind,
            description: "mercado".to_string(),
            amount,
            category: Category::Alimentacao,
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
        }
    }

    #[test]
    fn test_create_and_read_back() {
        let store = MemStorage::new();
        let user = store.create_user("Ana Souza", "ana@example.com").unwrap();
        let created = store
            .create_transaction(user.id, &new_txn(TransactionType::Expense, 50.0, 2))
            .unwrap();
        let txns = store.transactions_by_user(user.id).unwrap();
        assert_eq!(txns, vec![created]);
    }

    #[test]
    fn test_touch_user_updates_last_access() {
        let store = MemStorage::new();
        let user = store.create_user("Ana Souza", "ana@example.com").unwrap();
        assert!(user.last_access.is_some());
        let later = user.created_at + chrono::Duration::hours(3);
        store.touch_user(user.id, later).unwrap();
        assert_eq!(store.user(user.id).unwrap().unwrap().last_access, Some(later));
        assert!(store.touch_user(user.id + 1, later).is_err());
    }

    #[test]
    fn test_transactions_newest_first() {
        let store = MemStorage::new();
        let user = store.create_user("Ana Souza", "ana@example.com").unwrap();
        store.create_transaction(user.id, &new_txn(TransactionType::Expense, 10.0, 1)).unwrap();
        store.create_transaction(user.id, &new_txn(TransactionType::Income, 20.0, 9)).unwrap();
        store.create_transaction(user.id, &new_txn(TransactionType::Expense, 30.0, 5)).unwrap();
        let amounts: Vec<f64> = store
            .transactions_by_user(user.id)
            .unwrap()
            .iter()
            .map(|t| t.amount)
            .collect();
        assert_eq!(amounts, vec![20.0, 30.0, 10.0]);
    }

    #[test]
    fn test_rejects_invalid_transactions() {
        let store = MemStorage::new();
        let user = store.create_user("Ana Souza", "ana@example.com").unwrap();
        assert!(store.create_transaction(user.id, &new_txn(TransactionType::Expense, 0.0, 1)).is_err());
        assert!(store.create_transaction(user.id, &new_txn(TransactionType::Expense, -5.0, 1)).is_err());
        assert!(store.create_transaction(user.id, &new_txn(TransactionType::Expense, f64::NAN, 1)).is_err());
        assert!(store.create_transaction(99, &new_txn(TransactionType::Expense, 5.0, 1)).is_err());
        assert!(store.transactions_by_user(user.id).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = MemStorage::new();
        store.create_user("Ana", "ana@example.com").unwrap();
        assert!(store.create_user("Ana B", "ANA@example.com").is_err());
    }

    #[test]
    fn test_summary_per_user() {
        let store = MemStorage::new();
        let a = store.create_user("Ana", "ana@example.com").unwrap();
        let b = store.create_user("Bia", "bia@example.com").unwrap();
        store.create_transaction(a.id, &new_txn(TransactionType::Income, 1000.0, 1)).unwrap();
        store.create_transaction(a.id, &new_txn(TransactionType::Expense, 250.0, 2)).unwrap();
        store.create_transaction(b.id, &new_txn(TransactionType::Expense, 70.0, 2)).unwrap();

        let s = store.user_summary(a.id).unwrap();
        assert_eq!(s.balance, 750.0);
        assert_eq!(s.transaction_count, 2);
        assert_eq!(store.user_summary(b.id).unwrap().balance, -70.0);
    }

    #[test]
    fn test_phone_links_are_normalized() {
        let store = MemStorage::new();
        let user = store.create_user("Ana", "ana@example.com").unwrap();
        store.link_phone("+55 (11) 99999-0000", user.id).unwrap();
        assert_eq!(store.user_by_phone("5511999990000").unwrap(), Some(user.id));
        assert_eq!(store.user_by_phone("5511000000000").unwrap(), None);
        assert!(store.link_phone("n/a", user.id).is_err());
    }

    #[test]
    fn test_ledger_json_snapshot() {
        let dir = std::env::temp_dir().join(format!("finbot-ledger-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ledger.json");

        let store = MemStorage::new();
        let user = store.create_user("Ana", "ana@example.com").unwrap();
        store.create_transaction(user.id, &new_txn(TransactionType::Expense, 12.5, 3)).unwrap();
        store.link_phone("5511999990000", user.id).unwrap();
        store.save(&path).unwrap();

        let loaded = MemStorage::load(&path).unwrap();
        assert_eq!(loaded.transactions_by_user(user.id).unwrap().len(), 1);
        assert_eq!(loaded.user_by_phone("5511999990000").unwrap(), Some(user.id));
        // ids continue after reload
        let next = loaded.create_user("Bia", "bia@example.com").unwrap();
        assert_eq!(next.id, user.id + 1);

        fs::remove_dir_all(&dir).ok();
    }
}
