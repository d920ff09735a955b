pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::export::Dataset;
use crate::core::config::AppConfig;
use crate::core::persist::StateStore;
use crate::core::records::{RecordRef, ShipmentStatus};
use crate::core::reporting::DateWindow;
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const RATE_MAX_AGE: Duration = Duration::from_secs(60 * 60);

pub enum InventoryCommand {
    List,
    Add(cli::inventory::NewItem),
    Adjust { item_id: String, delta: i64 },
}

pub enum ExpenseCommand {
    Add(cli::expense::NewExpense),
    List { window: DateWindow },
}

pub enum BudgetCommand {
    Set {
        category: String,
        amount: f64,
        year: Option<i32>,
        month: Option<u32>,
    },
    Show {
        year: Option<i32>,
        month: Option<u32>,
    },
}

pub enum CustomerCommand {
    Add(cli::customer::NewCustomer),
    List,
}

pub enum InvoiceCommand {
    Create {
        customer_id: String,
        sale_ids: Vec<String>,
        issued_on: Option<NaiveDate>,
    },
    Pay {
        invoice: String,
    },
    List,
}

pub enum ShipCommand {
    Book(cli::ship::NewShipment),
    Status {
        shipment_id: String,
        status: ShipmentStatus,
        tracking_number: Option<String>,
    },
    List,
    Note {
        shipment_id: String,
    },
}

pub enum AppCommand {
    Import(cli::import::ImportOptions),
    Extract(cli::extract::ExtractOptions),
    Inventory(InventoryCommand),
    Sell(cli::sales::NewSale),
    Sales { window: DateWindow },
    Expense(ExpenseCommand),
    Budget(BudgetCommand),
    Report { window: DateWindow },
    Customer(CustomerCommand),
    Invoice(InvoiceCommand),
    Ship(ShipCommand),
    Delete { target: RecordRef, yes: bool },
    Export { dataset: Dataset, out: PathBuf, tsv: bool },
    Sync,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("shopkeep starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let state_store = store::open_state_store(&config)?;
    let store: &dyn StateStore = state_store.as_ref();
    let currency = config.currency.as_str();

    match command {
        AppCommand::Import(options) => {
            let rate_cache = Arc::new(providers::Cache::<String, f64>::with_max_age(RATE_MAX_AGE));
            let base_url = config
                .providers
                .rates
                .as_ref()
                .map_or("https://query1.finance.yahoo.com", |p| &p.base_url);
            let rates = providers::yahoo_rates::YahooRateProvider::new(base_url, rate_cache);
            cli::import::run(store, &config, &rates, options).await
        }
        AppCommand::Extract(options) => {
            let extraction = config
                .providers
                .extraction
                .as_ref()
                .ok_or_else(|| anyhow!("No extraction provider configured"))?;
            let service = providers::gemini::GeminiExtractionProvider::from_config(extraction);
            cli::extract::run(&service, options).await
        }
        AppCommand::Inventory(cmd) => match cmd {
            InventoryCommand::List => cli::inventory::list(store, currency),
            InventoryCommand::Add(item) => cli::inventory::add(store, item).map(|_| ()),
            InventoryCommand::Adjust { item_id, delta } => {
                cli::inventory::adjust(store, &item_id, delta)
            }
        },
        AppCommand::Sell(sale) => cli::sales::sell(store, &config, sale).map(|_| ()),
        AppCommand::Sales { window } => cli::sales::list(store, window, currency),
        AppCommand::Expense(cmd) => match cmd {
            ExpenseCommand::Add(expense) => cli::expense::add(store, expense).map(|_| ()),
            ExpenseCommand::List { window } => cli::expense::list(store, window, currency),
        },
        AppCommand::Budget(cmd) => match cmd {
            BudgetCommand::Set {
                category,
                amount,
                year,
                month,
            } => cli::budget::set(store, &category, amount, year, month),
            BudgetCommand::Show { year, month } => cli::budget::show(store, year, month, currency),
        },
        AppCommand::Report { window } => cli::report::run(store, window, currency),
        AppCommand::Customer(cmd) => match cmd {
            CustomerCommand::Add(customer) => cli::customer::add(store, customer).map(|_| ()),
            CustomerCommand::List => cli::customer::list(store),
        },
        AppCommand::Invoice(cmd) => match cmd {
            InvoiceCommand::Create {
                customer_id,
                sale_ids,
                issued_on,
            } => cli::invoice::create(store, &customer_id, &sale_ids, issued_on).map(|_| ()),
            InvoiceCommand::Pay { invoice } => cli::invoice::pay(store, &invoice),
            InvoiceCommand::List => cli::invoice::list(store, currency),
        },
        AppCommand::Ship(cmd) => match cmd {
            ShipCommand::Book(shipment) => cli::ship::book(store, shipment).map(|_| ()),
            ShipCommand::Status {
                shipment_id,
                status,
                tracking_number,
            } => cli::ship::update_status(store, &shipment_id, status, tracking_number),
            ShipCommand::List => cli::ship::list(store),
            ShipCommand::Note { shipment_id } => cli::ship::print_note(store, &shipment_id),
        },
        AppCommand::Delete { target, yes } => {
            let confirmed = yes
                || (store.load()?.contains(&target)
                    && cli::ui::confirm(&format!("Delete {:?}?", target)));
            cli::delete::run(store, target, confirmed).map(|_| ())
        }
        AppCommand::Export { dataset, out, tsv } => {
            cli::export::run(store, dataset, &out, tsv).map(|_| ())
        }
        AppCommand::Sync => {
            let endpoint = config
                .providers
                .sync
                .as_ref()
                .ok_or_else(|| anyhow!("No sync endpoint configured"))?;
            let sink = providers::sheets::SheetsSyncProvider::new(&endpoint.endpoint)?;
            cli::sync::run(store, &sink).await
        }
    }
}
