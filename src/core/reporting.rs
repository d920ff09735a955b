//! Revenue, profit and margin aggregates over the flat sales and expense
//! collections.
//!
//! All functions take `now` explicitly so that calendar windows are resolved
//! in the caller's timezone (the CLI passes `Local::now()`).

use crate::core::records::{ExpenseRecord, InventoryRecord, SaleRecord};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

const UNCATEGORIZED: &str = "Uncategorized";

/// Full cost of a sale line: unit, supply and shipping cost times quantity.
pub fn line_cost(sale: &SaleRecord) -> f64 {
    (sale.unit_cost + sale.supply_cost_per_unit + sale.shipping_cost_per_unit)
        * f64::from(sale.quantity)
}

pub fn line_profit(sale: &SaleRecord) -> f64 {
    sale.total_amount - line_cost(sale)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub count: usize,
}

impl Totals {
    pub fn add(&mut self, sale: &SaleRecord) {
        self.revenue += sale.total_amount;
        self.cost += line_cost(sale);
        self.profit += line_profit(sale);
        self.count += 1;
    }

    /// Profit as a percentage of revenue; 0 when there is no revenue.
    pub fn margin_pct(&self) -> f64 {
        if self.revenue > 0.0 {
            100.0 * self.profit / self.revenue
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    Today,
    ThisMonth,
    ThisYear,
    Month { year: i32, month: u32 },
    Year(i32),
    LastDays(u32),
    All,
}

impl DateWindow {
    /// Whether a calendar date falls in the window, given today's date.
    pub fn contains_date(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match *self {
            DateWindow::Today => date == today,
            DateWindow::ThisMonth => date.year() == today.year() && date.month() == today.month(),
            DateWindow::ThisYear => date.year() == today.year(),
            DateWindow::Month { year, month } => date.year() == year && date.month() == month,
            DateWindow::Year(year) => date.year() == year,
            DateWindow::LastDays(days) => {
                let after_start = Duration::try_days(i64::from(days))
                    .and_then(|span| today.checked_sub_signed(span))
                    .is_none_or(|start| date >= start);
                after_start && date <= today
            }
            DateWindow::All => true,
        }
    }

    /// Whether an instant falls in the window. Calendar windows compare the
    /// instant's date in `now`'s timezone; `LastDays` is a rolling duration.
    pub fn contains<Tz: TimeZone, Tz2: TimeZone>(
        &self,
        when: &DateTime<Tz2>,
        now: &DateTime<Tz>,
    ) -> bool {
        match *self {
            DateWindow::LastDays(days) => {
                let when = when.with_timezone(&now.timezone());
                // A span reaching past the representable range has no lower edge.
                let after_start = Duration::try_days(i64::from(days))
                    .and_then(|span| now.clone().checked_sub_signed(span))
                    .is_none_or(|start| when >= start);
                after_start && when <= *now
            }
            _ => {
                let local_date = when.with_timezone(&now.timezone()).date_naive();
                self.contains_date(local_date, now.date_naive())
            }
        }
    }
}

impl Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateWindow::Today => write!(f, "Today"),
            DateWindow::ThisMonth => write!(f, "This month"),
            DateWindow::ThisYear => write!(f, "This year"),
            DateWindow::Month { year, month } => write!(f, "{year}-{month:02}"),
            DateWindow::Year(year) => write!(f, "{year}"),
            DateWindow::LastDays(days) => write!(f, "Last {days} days"),
            DateWindow::All => write!(f, "All time"),
        }
    }
}

impl FromStr for DateWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "today" => return Ok(DateWindow::Today),
            "month" => return Ok(DateWindow::ThisMonth),
            "year" => return Ok(DateWindow::ThisYear),
            "all" => return Ok(DateWindow::All),
            _ => {}
        }
        if let Some(days) = s.strip_suffix('d') {
            return days
                .parse::<u32>()
                .map(DateWindow::LastDays)
                .map_err(|_| anyhow!("Invalid window: {}", s));
        }
        if let Some((year, month)) = s.split_once('-') {
            let year = year.parse::<i32>().map_err(|_| anyhow!("Invalid window: {}", s))?;
            let month = month
                .parse::<u32>()
                .ok()
                .filter(|m| (1..=12).contains(m))
                .ok_or_else(|| anyhow!("Invalid window: {}", s))?;
            return Ok(DateWindow::Month { year, month });
        }
        s.parse::<i32>()
            .map(DateWindow::Year)
            .map_err(|_| anyhow!("Invalid window: {}", s))
    }
}

pub fn summarize_sales<'a, Tz: TimeZone>(
    sales: impl IntoIterator<Item = &'a SaleRecord>,
    window: DateWindow,
    now: &DateTime<Tz>,
) -> Totals {
    let mut totals = Totals::default();
    for sale in sales {
        if window.contains(&sale.sold_at, now) {
            totals.add(sale);
        }
    }
    totals
}

pub fn sales_by_category<'a, Tz: TimeZone>(
    sales: impl IntoIterator<Item = &'a SaleRecord>,
    window: DateWindow,
    now: &DateTime<Tz>,
) -> BTreeMap<String, Totals> {
    let mut categories: BTreeMap<String, Totals> = BTreeMap::new();
    for sale in sales {
        if window.contains(&sale.sold_at, now) {
            let category = sale
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            categories.entry(category).or_default().add(sale);
        }
    }
    categories
}

pub fn expense_total<'a, Tz: TimeZone>(
    expenses: impl IntoIterator<Item = &'a ExpenseRecord>,
    window: DateWindow,
    now: &DateTime<Tz>,
) -> f64 {
    let today = now.date_naive();
    expenses
        .into_iter()
        .filter(|e| window.contains_date(e.date, today))
        .map(|e| e.amount)
        .sum()
}

pub fn expenses_by_category<'a, Tz: TimeZone>(
    expenses: impl IntoIterator<Item = &'a ExpenseRecord>,
    window: DateWindow,
    now: &DateTime<Tz>,
) -> BTreeMap<String, f64> {
    let today = now.date_naive();
    let mut categories: BTreeMap<String, f64> = BTreeMap::new();
    for expense in expenses {
        if window.contains_date(expense.date, today) {
            *categories.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
        }
    }
    categories
}

/// Cost basis of everything currently on the shelf.
pub fn stock_value<'a>(inventory: impl IntoIterator<Item = &'a InventoryRecord>) -> f64 {
    inventory.into_iter().map(InventoryRecord::stock_value).sum()
}

/// Headline figures for one window.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub window: DateWindow,
    pub sales: Totals,
    pub expenses: f64,
    pub net_profit: f64,
    pub stock_value: f64,
}

pub fn dashboard<Tz: TimeZone>(
    state: &crate::core::state::AppState,
    window: DateWindow,
    now: &DateTime<Tz>,
) -> Dashboard {
    let sales = summarize_sales(&state.sales, window, now);
    let expenses = expense_total(&state.expenses, window, now);
    Dashboard {
        window,
        sales,
        expenses,
        net_profit: sales.profit - expenses,
        stock_value: stock_value(&state.inventory),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn sale(category: Option<&str>, at: DateTime<Utc>, quantity: u32, total: f64) -> SaleRecord {
        SaleRecord {
            id: format!("{at}"),
            item_id: None,
            item_name: "Thing".to_string(),
            category: category.map(str::to_string),
            quantity,
            unit_price: total / f64::from(quantity),
            total_amount: total,
            unit_cost: 50.0,
            supply_cost_per_unit: 5.0,
            shipping_cost_per_unit: 15.0,
            customer_id: None,
            sold_at: at,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn line_figures_include_supply_and_shipping() {
        let s = sale(None, utc(2026, 3, 1, 9), 2, 300.0);
        assert_eq!(line_cost(&s), 140.0);
        assert_eq!(line_profit(&s), 160.0);
    }

    #[test]
    fn margin_is_zero_without_revenue() {
        assert_eq!(Totals::default().margin_pct(), 0.0);
        let mut totals = Totals::default();
        totals.add(&sale(None, utc(2026, 3, 1, 9), 1, 0.0));
        assert_eq!(totals.margin_pct(), 0.0);
        assert!(!totals.margin_pct().is_nan());
    }

    #[test]
    fn summarizes_month_window() {
        let now = utc(2026, 3, 20, 12);
        let sales = vec![
            sale(Some("Tops"), utc(2026, 3, 1, 9), 1, 200.0),
            sale(Some("Tops"), utc(2026, 3, 19, 9), 1, 100.0),
            sale(Some("Bags"), utc(2026, 2, 28, 9), 1, 500.0),
        ];

        let totals = summarize_sales(&sales, DateWindow::ThisMonth, &now);
        assert_eq!(totals.count, 2);
        assert_eq!(totals.revenue, 300.0);
        assert_eq!(totals.profit, 300.0 - 140.0);
        assert!((totals.margin_pct() - 100.0 * 160.0 / 300.0).abs() < 1e-9);

        let all = summarize_sales(&sales, DateWindow::All, &now);
        assert_eq!(all.count, 3);
    }

    #[test]
    fn calendar_day_follows_the_callers_timezone() {
        // 23:30 UTC on the 9th is already the 10th at UTC+8.
        let sold = utc(2026, 3, 9, 23) + Duration::minutes(30);
        let sales = vec![sale(None, sold, 1, 100.0)];

        let manila = FixedOffset::east_opt(8 * 3600).unwrap();
        let now_manila = manila.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        assert_eq!(summarize_sales(&sales, DateWindow::Today, &now_manila).count, 1);

        let now_utc = utc(2026, 3, 10, 1);
        assert_eq!(summarize_sales(&sales, DateWindow::Today, &now_utc).count, 0);
    }

    #[test]
    fn last_days_is_a_rolling_duration() {
        let now = utc(2026, 3, 20, 12);
        let sales = vec![
            sale(None, utc(2026, 3, 13, 13), 1, 100.0),
            sale(None, utc(2026, 3, 13, 11), 1, 100.0),
        ];
        assert_eq!(summarize_sales(&sales, DateWindow::LastDays(7), &now).count, 1);
    }

    #[test]
    fn huge_day_count_covers_everything_up_to_now() {
        let now = utc(2026, 3, 20, 12);
        let window: DateWindow = "4000000000d".parse().unwrap();
        let sales = vec![
            sale(None, utc(1990, 1, 1, 0), 1, 100.0),
            sale(None, utc(2026, 3, 21, 0), 1, 100.0),
        ];
        assert_eq!(summarize_sales(&sales, window, &now).count, 1);

        let expenses = vec![ExpenseRecord {
            id: "old".to_string(),
            date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            category: "Rent".to_string(),
            amount: 75.0,
            note: None,
        }];
        assert_eq!(expense_total(&expenses, window, &now), 75.0);
    }

    #[test]
    fn groups_by_category() {
        let now = utc(2026, 3, 20, 12);
        let sales = vec![
            sale(Some("Tops"), utc(2026, 3, 1, 9), 1, 200.0),
            sale(None, utc(2026, 3, 2, 9), 1, 100.0),
            sale(Some("Tops"), utc(2026, 3, 3, 9), 1, 120.0),
        ];
        let categories = sales_by_category(&sales, DateWindow::ThisYear, &now);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories["Tops"].revenue, 320.0);
        assert_eq!(categories[UNCATEGORIZED].count, 1);
    }

    #[test]
    fn expenses_use_calendar_dates() {
        let now = utc(2026, 3, 20, 12);
        let expense = |d: u32, m: u32, amount: f64| ExpenseRecord {
            id: format!("{m}-{d}"),
            date: NaiveDate::from_ymd_opt(2026, m, d).unwrap(),
            category: (if m == 3 { "Ads" } else { "Rent" }).to_string(),
            amount,
            note: None,
        };
        let expenses = vec![expense(1, 3, 40.0), expense(5, 3, 60.0), expense(28, 2, 500.0)];

        assert_eq!(expense_total(&expenses, DateWindow::ThisMonth, &now), 100.0);
        assert_eq!(
            expense_total(&expenses, DateWindow::Month { year: 2026, month: 2 }, &now),
            500.0
        );
        let by_category = expenses_by_category(&expenses, DateWindow::ThisYear, &now);
        assert_eq!(by_category["Ads"], 100.0);
        assert_eq!(by_category["Rent"], 500.0);
    }

    #[test]
    fn parses_windows() {
        assert_eq!("today".parse::<DateWindow>().unwrap(), DateWindow::Today);
        assert_eq!("30d".parse::<DateWindow>().unwrap(), DateWindow::LastDays(30));
        assert_eq!(
            "2026-04".parse::<DateWindow>().unwrap(),
            DateWindow::Month {
                year: 2026,
                month: 4
            }
        );
        assert_eq!("2025".parse::<DateWindow>().unwrap(), DateWindow::Year(2025));
        assert!("2026-13".parse::<DateWindow>().is_err());
        assert!("soon".parse::<DateWindow>().is_err());
    }
}
