//! Rule-based spending analysis and the daily summary card.

use chrono::{Duration, NaiveDate};
use finbot_core::{Category, Transaction, format_brl};
use serde::Serialize;
use std::collections::BTreeMap;

const HIGH_SPENDING: f64 = 5000.0;
const CONCENTRATION_PCT: f64 = 50.0;
const TREND_BAND: f64 = 0.10;
const TREND_MONTHS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Warning,
    Tip,
    Achievement,
    Suggestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendingTrend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialInsight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSummary {
    pub total_spent: f64,
    pub top_categories: Vec<CategoryShare>,
    pub spending_trend: SpendingTrend,
    /// Expenses over the last 30 days
    pub monthly_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingAnalysis {
    pub insights: Vec<FinancialInsight>,
    pub summary: SpendingSummary,
}

/// Top 5 expense categories by amount, with their share of total spending.
pub fn top_categories(transactions: &[Transaction]) -> Vec<CategoryShare> {
    let mut totals: BTreeMap<Category, f64> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.is_expense()) {
        *totals.entry(t.category).or_insert(0.0) += t.amount;
    }
    let total: f64 = totals.values().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut shares: Vec<CategoryShare> = totals
        .into_iter()
        .map(|(category, amount)| CategoryShare {
            category,
            amount,
            percentage: amount * 100.0 / total,
        })
        .collect();
    shares.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    shares.truncate(5);
    shares
}

fn spent_between(transactions: &[Transaction], from: NaiveDate, to: NaiveDate) -> f64 {
    transactions
        .iter()
        .filter(|t| t.is_expense() && t.date > from && t.date <= to)
        .map(|t| t.amount)
        .sum()
}

pub fn analyze_spending(transactions: &[Transaction], today: NaiveDate) -> SpendingAnalysis {
    let total_spent: f64 = transactions
        .iter()
        .filter(|t| t.is_expense())
        .map(|t| t.amount)
        .sum();
    let top = top_categories(transactions);

    let last_30 = spent_between(transactions, today - Duration::days(30), today);
    let prior_30 = spent_between(
        transactions,
        today - Duration::days(60),
        today - Duration::days(30),
    );
    let spending_trend = if prior_30 <= 0.0 {
        SpendingTrend::Stable
    } else if last_30 > prior_30 * (1.0 + TREND_BAND) {
        SpendingTrend::Increasing
    } else if last_30 < prior_30 * (1.0 - TREND_BAND) {
        SpendingTrend::Decreasing
    } else {
        SpendingTrend::Stable
    };

    let mut insights = Vec::new();
    if total_spent > HIGH_SPENDING {
        insights.push(FinancialInsight {
            kind: InsightKind::Warning,
            title: "Gastos Elevados".to_string(),
            description: format!(
                "Você gastou mais de {} recentemente. Considere revisar seus gastos.",
                format_brl(HIGH_SPENDING)
            ),
            category: None,
            priority: Priority::High,
        });
    }
    if let Some(first) = top.first().filter(|c| c.percentage > CONCENTRATION_PCT) {
        insights.push(FinancialInsight {
            kind: InsightKind::Tip,
            title: format!("Concentração em {}", first.category),
            description: format!(
                "Mais de 50% dos seus gastos estão em {}. Diversifique seus gastos.",
                first.category
            ),
            category: Some(first.category),
            priority: Priority::Medium,
        });
    }

    SpendingAnalysis {
        insights,
        summary: SpendingSummary {
            total_spent,
            top_categories: top,
            spending_trend,
            monthly_average: last_30,
        },
    }
}

/// Income and expenses for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTrend {
    /// `YYYY-MM`
    pub month: String,
    pub income: f64,
    pub expenses: f64,
}

/// Per-month totals for the last six months that have any transactions,
/// oldest first.
pub fn monthly_trends(transactions: &[Transaction]) -> Vec<MonthTrend> {
    let mut months: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for t in transactions {
        let entry = months
            .entry(t.date.format("%Y-%m").to_string())
            .or_insert((0.0, 0.0));
        if t.is_income() {
            entry.0 += t.amount;
        } else {
            entry.1 += t.amount;
        }
    }

    let skip = months.len().saturating_sub(TREND_MONTHS);
    months
        .into_iter()
        .skip(skip)
        .map(|(month, (income, expenses))| MonthTrend {
            month,
            income,
            expenses,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub summary: String,
    pub today_spent: f64,
    pub current_balance: f64,
    pub today_transactions_count: usize,
}

pub fn daily_summary(
    name: &str,
    transactions: &[Transaction],
    balance: f64,
    today: NaiveDate,
) -> DailySummary {
    let todays: Vec<&Transaction> = transactions.iter().filter(|t| t.date == today).collect();
    let today_spent: f64 = todays.iter().filter(|t| t.is_expense()).map(|t| t.amount).sum();
    let name = match name.trim() {
        "" => "Usuário",
        n => n,
    };

    DailySummary {
        summary: format!(
            "Olá {name}! Hoje você gastou {} e seu saldo atual é {}.",
            format_brl(today_spent),
            format_brl(balance)
        ),
        today_spent,
        current_balance: balance,
        today_transactions_count: todays.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use finbot_core::TransactionType;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn expense(id: u64, amount: f64, category: Category, date: NaiveDate) -> Transaction {
        Transaction {
            id,
            user_id: 1,
            kind: TransactionType::Expense,
            description: "x".to_string(),
            amount,
            category,
            date,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_top_categories_sorted_with_share() {
        let txns = vec![
            expense(1, 100.0, Category::Lazer, d(3, 1)),
            expense(2, 300.0, Category::Alimentacao, d(3, 2)),
            expense(3, 100.0, Category::Alimentacao, d(3, 3)),
        ];
        let top = top_categories(&txns);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].category, Category::Alimentacao);
        assert_eq!(top[0].amount, 400.0);
        assert_eq!(top[0].percentage, 80.0);
        assert_eq!(top[1].percentage, 20.0);
    }

    #[test]
    fn test_concentration_and_high_spending() {
        let txns = vec![
            expense(1, 4000.0, Category::Casa, d(3, 1)),
            expense(2, 1500.0, Category::Lazer, d(3, 2)),
        ];
        let a = analyze_spending(&txns, d(3, 10));
        assert_eq!(a.summary.total_spent, 5500.0);
        let kinds: Vec<InsightKind> = a.insights.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![InsightKind::Warning, InsightKind::Tip]);
        assert_eq!(a.insights[1].category, Some(Category::Casa));
    }

    #[test]
    fn test_no_expenses_no_insights() {
        let a = analyze_spending(&[], d(3, 10));
        assert!(a.insights.is_empty());
        assert!(a.summary.top_categories.is_empty());
        assert_eq!(a.summary.spending_trend, SpendingTrend::Stable);
    }

    #[test]
    fn test_trend_compares_last_two_windows() {
        let txns = vec![
            expense(1, 100.0, Category::Lazer, d(1, 20)),
            expense(2, 300.0, Category::Lazer, d(3, 1)),
        ];
        let a = analyze_spending(&txns, d(3, 10));
        assert_eq!(a.summary.spending_trend, SpendingTrend::Increasing);
        assert_eq!(a.summary.monthly_average, 300.0);
    }

    #[test]
    fn test_monthly_trends_keep_last_six_sorted() {
        let mut txns: Vec<Transaction> = (1..=8)
            .map(|m| expense(m as u64, 10.0 * m as f64, Category::Lazer, d(m, 5)))
            .collect();
        let mut salary = expense(20, 1000.0, Category::Trabalho, d(8, 1));
        salary.kind = TransactionType::Income;
        txns.push(salary);
        txns.reverse();

        let trends = monthly_trends(&txns);
        let months: Vec<&str> = trends.iter().map(|t| t.month.as_str()).collect();
        assert_eq!(months, ["2026-03", "2026-04", "2026-05", "2026-06", "2026-07", "2026-08"]);
        let last = trends.last().unwrap();
        assert_eq!(last.income, 1000.0);
        assert_eq!(last.expenses, 80.0);
        assert_eq!(trends[0].income, 0.0);
    }

    #[test]
    fn test_monthly_trends_empty() {
        assert!(monthly_trends(&[]).is_empty());
    }

    #[test]
    fn test_daily_summary() {
        let txns = vec![
            expense(1, 12.5, Category::Alimentacao, d(3, 10)),
            expense(2, 7.5, Category::Transporte, d(3, 10)),
            expense(3, 99.0, Category::Lazer, d(3, 9)),
        ];
        let s = daily_summary("Ana", &txns, 350.0, d(3, 10));
        assert_eq!(s.today_spent, 20.0);
        assert_eq!(s.today_transactions_count, 2);
        assert_eq!(s.summary, "Olá Ana! Hoje você gastou R$ 20,00 e seu saldo atual é R$ 350,00.");
        assert!(daily_summary("", &[], 0.0, d(3, 10)).summary.starts_with("Olá Usuário!"));
    }

    #[test]
    fn test_analysis_wire_shape() {
        let txns = vec![expense(1, 6000.0, Category::Casa, d(3, 1))];
        let v = serde_json::to_value(analyze_spending(&txns, d(3, 10))).unwrap();
        assert_eq!(v["insights"][0]["type"], "warning");
        assert_eq!(v["insights"][0]["priority"], "high");
        assert_eq!(v["summary"]["spendingTrend"], "stable");
        assert_eq!(v["summary"]["topCategories"][0]["category"], "Casa");
    }
}
