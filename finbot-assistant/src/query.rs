//! Text reports for balance / spending / statement questions.

use chrono::NaiveDate;
use finbot_core::time::{month_name_pt, same_month};
use finbot_core::{Transaction, UserFinancialContext, format_brl};

use crate::command::QueryType;

/// Sum of expenses dated in the same calendar month as `today`.
pub fn month_expenses(transactions: &[Transaction], today: NaiveDate) -> f64 {
    transactions
        .iter()
        .filter(|t| t.is_expense() && same_month(t.date, today))
        .map(|t| t.amount)
        .sum()
}

pub fn respond(
    query_type: QueryType,
    context: &UserFinancialContext,
    transactions: &[Transaction],
    today: NaiveDate,
) -> String {
    match query_type {
        QueryType::Balance => {
            let remark = if context.balance > 0.0 {
                "✅ Você está com saldo positivo!"
            } else {
                "⚠️ Considere revisar seus gastos."
            };
            format!(
                "💰 Seu saldo atual\nSaldo: {}\n\n{remark}",
                format_brl(context.balance)
            )
        }
        QueryType::Expenses => {
            let count = transactions.iter().filter(|t| t.is_expense()).count();
            format!(
                "📊 Seus gastos\nTotal gasto: {}\nNúmero de transações: {count}\n\n\
💡 Dica: use o dashboard para ver o gráfico por categorias!",
                format_brl(context.total_expenses)
            )
        }
        QueryType::Period => format!(
            "📅 Extrato do mês\nGastos em {}: {}\nSaldo atual: {}\n\n\
📈 Compare com meses anteriores no dashboard!",
            month_name_pt(today),
            format_brl(month_expenses(transactions, today)),
            format_brl(context.balance)
        ),
        QueryType::Generic => format!(
            "📋 Resumo financeiro\n• Saldo: {}\n• Receitas: {}\n• Gastos: {}\n\n\
🎯 Continue acompanhando suas finanças!",
            format_brl(context.balance),
            format_brl(context.total_income),
            format_brl(context.total_expenses)
        ),
    }
}
