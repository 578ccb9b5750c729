//! CSV export of a user's transactions (same columns as the transactions page).

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::finance::Transaction;

const HEADER: [&str; 6] = ["Data", "Tipo", "Descrição", "Categoria", "Valor", "ID"];

/// Write transactions as CSV to any writer.
pub fn write_transactions_csv<W: Write>(txns: &[Transaction], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for t in txns {
        wtr.write_record([
            t.date.format("%Y-%m-%d").to_string(),
            t.kind.label().to_string(),
            t.description.clone(),
            t.category.name().to_string(),
            format!("{:.2}", t.amount),
            t.id.to_string(),
        ])?;
    }
    wtr.flush().context("flush csv")?;
    Ok(())
}

pub fn export_transactions_csv(txns: &[Transaction], path: impl AsRef<Path>) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())
        .with_context(|| format!("create {}", path.as_ref().display()))?;
    write_transactions_csv(txns, file)
}
