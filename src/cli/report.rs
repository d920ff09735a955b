use super::ui;
use crate::core::persist::StateStore;
use crate::core::reporting::{
    Dashboard, DateWindow, dashboard, expenses_by_category, sales_by_category,
};
use crate::core::state::AppState;
use anyhow::Result;
use chrono::{DateTime, TimeZone};
use comfy_table::Cell;

impl Dashboard {
    pub fn display_as_table(&self, currency: &str) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Metric"),
            ui::header_cell(&format!("Amount ({currency})")),
        ]);
        table.add_row(vec![Cell::new("Sales"), ui::count_cell(self.sales.count)]);
        table.add_row(vec![Cell::new("Revenue"), ui::money_cell(self.sales.revenue)]);
        table.add_row(vec![Cell::new("Cost of sales"), ui::money_cell(self.sales.cost)]);
        table.add_row(vec![
            Cell::new("Gross profit"),
            ui::profit_cell(self.sales.profit),
        ]);
        table.add_row(vec![
            Cell::new("Margin"),
            ui::margin_cell(self.sales.margin_pct()),
        ]);
        table.add_row(vec![Cell::new("Expenses"), ui::money_cell(self.expenses)]);
        table.add_row(vec![Cell::new("Stock value"), ui::money_cell(self.stock_value)]);

        let net_style = if self.net_profit >= 0.0 {
            ui::StyleType::TotalValue
        } else {
            ui::StyleType::Error
        };
        format!(
            "Report: {}\n\n{}\n\n{}: {}",
            ui::style_text(&self.window.to_string(), ui::StyleType::Title),
            table,
            ui::style_text(&format!("Net profit ({currency})"), ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2}", self.net_profit), net_style)
        )
    }
}

pub fn render<Tz: TimeZone>(
    state: &AppState,
    window: DateWindow,
    now: &DateTime<Tz>,
    currency: &str,
) -> String {
    let mut output = dashboard(state, window, now).display_as_table(currency);

    let categories = sales_by_category(&state.sales, window, now);
    if !categories.is_empty() {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Category"),
            ui::header_cell("Sales"),
            ui::header_cell("Revenue"),
            ui::header_cell("Profit"),
            ui::header_cell("Margin"),
        ]);
        for (category, totals) in &categories {
            table.add_row(vec![
                Cell::new(category),
                ui::count_cell(totals.count),
                ui::money_cell(totals.revenue),
                ui::profit_cell(totals.profit),
                ui::margin_cell(totals.margin_pct()),
            ]);
        }
        output.push_str(&format!(
            "\n\n{}\n{}",
            ui::style_text("Sales by category", ui::StyleType::TotalLabel),
            table
        ));
    }

    let expenses = expenses_by_category(&state.expenses, window, now);
    if !expenses.is_empty() {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Category"), ui::header_cell("Spent")]);
        for (category, amount) in &expenses {
            table.add_row(vec![Cell::new(category), ui::money_cell(*amount)]);
        }
        output.push_str(&format!(
            "\n\n{}\n{}",
            ui::style_text("Expenses by category", ui::StyleType::TotalLabel),
            table
        ));
    }
    output
}

pub fn run(store: &dyn StateStore, window: DateWindow, currency: &str) -> Result<()> {
    let state = store.load()?;
    println!("{}", render(&state, window, &chrono::Local::now(), currency));
    Ok(())
}
