//! Deterministic category rules mapping free-text context to a Category.
//!
//! Keyword groups are checked in order; the first group with a hit wins.
//! Anything unmatched is `Outros`.

use finbot_core::{Category, TransactionType};

const EXPENSE_RULES: &[(&[&str], Category)] = &[
    (
        &["mercado", "supermercado", "comida", "restaurante", "lanche", "pizza"],
        Category::Alimentacao,
    ),
    (
        &["uber", "táxi", "ônibus", "gasolina", "combustível", "transporte"],
        Category::Transporte,
    ),
    (
        &["aluguel", "casa", "conta", "energia", "água", "internet"],
        Category::Casa,
    ),
    (&["médico", "farmácia", "remédio", "consulta"], Category::Saude),
    (&["cinema", "festa", "balada", "jogo"], Category::Lazer),
    (&["roupa", "sapato", "compra", "loja"], Category::Compras),
];

const INCOME_RULES: &[(&[&str], Category)] = &[(
    &["salário", "trabalho", "emprego", "freelance", "extra", "projeto"],
    Category::Trabalho,
)];

/// Classify the context of a transaction. Total: every input yields a category.
pub fn classify(context: &str, kind: TransactionType) -> Category {
    let ctx = context.to_lowercase();
    let rules = match kind {
        TransactionType::Expense => EXPENSE_RULES,
        TransactionType::Income => INCOME_RULES,
    };

    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| ctx.contains(k)))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Outros)
}
