//! finbot-core: Core finance types, persistence contract and formatting helpers

pub mod export;
pub mod finance;
pub mod money;
pub mod storage;
pub mod time;

pub use export::{export_transactions_csv, write_transactions_csv};
pub use finance::{
    AdminStats, Category, NewTransaction, Transaction, TransactionType, User, UserFinancialContext, UserId,
    UserSummary, admin_stats,
};
pub use money::format_brl;
pub use storage::{Ledger, MemStorage, Storage};
