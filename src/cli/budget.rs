use super::{commit, ui};
use crate::core::budget::{BudgetLine, budget_report};
use crate::core::persist::StateStore;
use crate::core::records::BudgetEntry;
use crate::core::state::Action;
use anyhow::{Result, bail};
use chrono::{Datelike, Local};
use comfy_table::Cell;
use tracing::info;

/// Resolves an optional `YYYY-MM` argument, defaulting to the current month.
pub fn month_or_current(year: Option<i32>, month: Option<u32>) -> Result<(i32, u32)> {
    let today = Local::now().date_naive();
    let year = year.unwrap_or_else(|| today.year());
    let month = month.unwrap_or_else(|| today.month());
    if !(1..=12).contains(&month) {
        bail!("Invalid month: {}", month);
    }
    Ok((year, month))
}

pub fn set(
    store: &dyn StateStore,
    category: &str,
    amount: f64,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<()> {
    let category = category.trim();
    if category.is_empty() {
        bail!("Budget category is required");
    }
    let (year, month) = month_or_current(year, month)?;
    commit(
        store,
        Action::SetBudget(BudgetEntry {
            year,
            month,
            category: category.to_string(),
            amount: amount.max(0.0),
        }),
    )?;
    info!(category, year, month, amount, "Set budget");
    println!("Budget for {category} in {year}-{month:02} set to {amount:.2}");
    Ok(())
}

pub fn render(lines: &[BudgetLine], year: i32, month: u32, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell(&format!("Budget ({currency})")),
        ui::header_cell("Actual"),
        ui::header_cell("Remaining"),
        ui::header_cell("Used"),
        ui::header_cell("Status"),
    ]);
    for line in lines {
        table.add_row(vec![
            Cell::new(&line.category),
            ui::money_cell(line.budget),
            ui::money_cell(line.actual),
            ui::profit_cell(line.remaining),
            ui::format_optional_cell(line.consumed_pct, |p| format!("{p:.1}%")),
            ui::flag_cell(line.over_budget, "OVER"),
        ]);
    }
    format!(
        "{}\n\n{}",
        ui::style_text(&format!("Budget {year}-{month:02}"), ui::StyleType::Title),
        table
    )
}

pub fn show(
    store: &dyn StateStore,
    year: Option<i32>,
    month: Option<u32>,
    currency: &str,
) -> Result<()> {
    let (year, month) = month_or_current(year, month)?;
    let state = store.load()?;
    let lines = budget_report(&state.budgets, &state.expenses, year, month);
    if lines.is_empty() {
        println!("No budgets or expenses for {year}-{month:02}.");
        return Ok(());
    }
    println!("{}", render(&lines, year, month, currency));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStateStore;

    #[test]
    fn test_set_upserts() {
        let store = MemoryStateStore::new();
        set(&store, "Ads", 100.0, Some(2026), Some(4)).unwrap();
        set(&store, "Ads", 250.0, Some(2026), Some(4)).unwrap();
        set(&store, "Ads", -1.0, Some(2026), Some(5)).unwrap();

        let budgets = store.load().unwrap().budgets;
        assert_eq!(budgets.len(), 2);
        assert_eq!(budgets[0].amount, 250.0);
        assert_eq!(budgets[1].amount, 0.0);
    }

    #[test]
    fn test_invalid_month() {
        let store = MemoryStateStore::new();
        assert!(set(&store, "Ads", 1.0, Some(2026), Some(13)).is_err());
        assert!(set(&store, " ", 1.0, Some(2026), Some(1)).is_err());
    }

    #[test]
    fn test_render_flags_over_budget() {
        let lines = vec![BudgetLine {
            category: "Ads".to_string(),
            budget: 100.0,
            actual: 150.0,
            remaining: -50.0,
            consumed_pct: Some(150.0),
            over_budget: true,
        }];
        let output = render(&lines, 2026, 4, "PHP");
        assert!(output.contains("OVER"));
        assert!(output.contains("150.0%"));
    }
}
