//! Monthly budget ceilings per expense category, and how much of each has
//! been spent.

use crate::core::records::{BudgetEntry, ExpenseRecord};
use chrono::Datelike;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BudgetKey {
    pub year: i32,
    pub month: u32,
    pub category: String,
}

impl From<&BudgetEntry> for BudgetKey {
    fn from(entry: &BudgetEntry) -> Self {
        BudgetKey {
            year: entry.year,
            month: entry.month,
            category: entry.category.clone(),
        }
    }
}

impl From<&ExpenseRecord> for BudgetKey {
    fn from(expense: &ExpenseRecord) -> Self {
        BudgetKey {
            year: expense.date.year(),
            month: expense.date.month(),
            category: expense.category.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetLine {
    pub category: String,
    pub budget: f64,
    pub actual: f64,
    pub remaining: f64,
    pub consumed_pct: Option<f64>,
    pub over_budget: bool,
}

/// Spend above the ceiling is over budget, and so is any spend at all in a
/// category with no (or a zero) ceiling.
pub fn is_over_budget(budget: f64, actual: f64) -> bool {
    actual > budget || (budget <= 0.0 && actual > 0.0)
}

/// Budget vs. actual for every category that is budgeted or has spend in the
/// given month, ordered by category name.
pub fn budget_report(
    budgets: &[BudgetEntry],
    expenses: &[ExpenseRecord],
    year: i32,
    month: u32,
) -> Vec<BudgetLine> {
    let mut lines: BTreeMap<String, (f64, f64)> = BTreeMap::new();

    for entry in budgets.iter().filter(|b| b.year == year && b.month == month) {
        lines.entry(entry.category.clone()).or_default().0 = entry.amount.max(0.0);
    }
    for expense in expenses {
        let key = BudgetKey::from(expense);
        if key.year == year && key.month == month {
            lines.entry(key.category).or_default().1 += expense.amount;
        }
    }

    lines
        .into_iter()
        .map(|(category, (budget, actual))| BudgetLine {
            category,
            budget,
            actual,
            remaining: budget - actual,
            consumed_pct: (budget > 0.0).then(|| 100.0 * actual / budget),
            over_budget: is_over_budget(budget, actual),
        })
        .collect()
}
