use super::{commit, non_blank, ui};
use crate::core::budget::{BudgetKey, budget_report};
use crate::core::persist::StateStore;
use crate::core::records::{ExpenseRecord, new_id};
use crate::core::reporting::{DateWindow, expense_total};
use crate::core::state::{Action, AppState};
use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use comfy_table::Cell;
use tracing::{info, warn};

pub struct NewExpense {
    pub category: String,
    pub amount: f64,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Records an expense and returns its id. Prints a warning when the spend
/// pushes its category over that month's budget.
pub fn add(store: &dyn StateStore, expense: NewExpense) -> Result<String> {
    let category = expense.category.trim().to_string();
    if category.is_empty() {
        bail!("Expense category is required");
    }
    if expense.amount <= 0.0 {
        bail!("Expense amount must be positive");
    }

    let record = ExpenseRecord {
        id: new_id(),
        date: expense.date.unwrap_or_else(|| Local::now().date_naive()),
        category,
        amount: expense.amount,
        note: non_blank(expense.note),
    };
    let id = record.id.clone();
    let key = BudgetKey::from(&record);
    let state = commit(store, Action::AddExpense(record))?;
    info!(%id, "Recorded expense");
    println!("Recorded expense {id}");

    if let Some(line) = budget_report(&state.budgets, &state.expenses, key.year, key.month)
        .into_iter()
        .find(|line| line.category == key.category && line.over_budget)
    {
        warn!(category = %line.category, "Category over budget");
        println!(
            "{}",
            ui::style_text(
                &format!(
                    "{} is over budget for {}-{:02}: {:.2} spent of {:.2}",
                    line.category, key.year, key.month, line.actual, line.budget
                ),
                ui::StyleType::Error
            )
        );
    }
    Ok(id)
}

pub fn render(state: &AppState, window: DateWindow, currency: &str) -> String {
    let now = Local::now();
    let today = now.date_naive();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Date"),
        ui::header_cell("Category"),
        ui::header_cell(&format!("Amount ({currency})")),
        ui::header_cell("Note"),
    ]);

    let mut expenses: Vec<&ExpenseRecord> = state
        .expenses
        .iter()
        .filter(|e| window.contains_date(e.date, today))
        .collect();
    expenses.sort_by_key(|e| e.date);
    for expense in expenses {
        table.add_row(vec![
            Cell::new(&expense.id),
            Cell::new(expense.date),
            Cell::new(&expense.category),
            ui::money_cell(expense.amount),
            Cell::new(expense.note.as_deref().unwrap_or("")),
        ]);
    }

    format!(
        "{}\n\n{}\n\nTotal: {:.2}",
        ui::style_text(&format!("Expenses: {window}"), ui::StyleType::Title),
        table,
        expense_total(&state.expenses, window, &now)
    )
}

pub fn list(store: &dyn StateStore, window: DateWindow, currency: &str) -> Result<()> {
    println!("{}", render(&store.load()?, window, currency));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::BudgetEntry;
    use crate::store::memory::MemoryStateStore;

    fn expense(amount: f64) -> NewExpense {
        NewExpense {
            category: " Ads ".to_string(),
            amount,
            date: NaiveDate::from_ymd_opt(2026, 4, 3),
            note: Some(String::new()),
        }
    }

    #[test]
    fn test_add_records_expense() {
        let store = MemoryStateStore::with_state(AppState {
            budgets: vec![BudgetEntry {
                year: 2026,
                month: 4,
                category: "Ads".to_string(),
                amount: 100.0,
            }],
            ..AppState::default()
        });

        let id = add(&store, expense(150.0)).unwrap();

        let state = store.load().unwrap();
        let recorded = state.expenses.iter().find(|e| e.id == id).unwrap();
        assert_eq!(recorded.category, "Ads");
        assert_eq!(recorded.note, None);
        assert!(render(&state, DateWindow::All, "PHP").contains("150.00"));
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        let store = MemoryStateStore::new();
        assert!(add(&store, expense(0.0)).is_err());
        assert!(add(&store, expense(-5.0)).is_err());
        assert!(store.load().unwrap().expenses.is_empty());
    }
}
