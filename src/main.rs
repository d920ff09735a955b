use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use shopkeep::cli::{customer, expense, extract, import, inventory, sales, ship};
use shopkeep::core::log::init_logging;
use shopkeep::core::money::normalize_amount;
use shopkeep::core::records::{RecordRef, ShipmentStatus};
use shopkeep::core::reporting::DateWindow;
use shopkeep::{
    AppCommand, BudgetCommand, CustomerCommand, ExpenseCommand, InventoryCommand,
    InvoiceCommand, ShipCommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn parse_amount(raw: &str) -> Result<f64, String> {
    normalize_amount(raw).ok_or_else(|| format!("'{raw}' is not an amount"))
}

fn parse_window(raw: &str) -> Result<DateWindow, String> {
    raw.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_status(raw: &str) -> Result<ShipmentStatus, String> {
    raw.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_month(raw: &str) -> Result<(i32, u32), String> {
    match raw.parse::<DateWindow>() {
        Ok(DateWindow::Month { year, month }) => Ok((year, month)),
        _ => Err(format!("'{raw}' is not a YYYY-MM month")),
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Preview a batch file's landed costs, and add it to inventory with --confirm
    Import {
        /// Batch YAML file
        batch: PathBuf,
        /// Add the previewed items to inventory
        #[arg(long)]
        confirm: bool,
        /// Fetch the current exchange rate when the batch has none
        #[arg(long)]
        fetch_rate: bool,
        /// Pin an item's unit cost, as item=cost (foreign currency)
        #[arg(long = "manual", value_name = "ITEM=COST")]
        manual: Vec<String>,
        /// Return an item to automatic allocation
        #[arg(long = "auto", value_name = "ITEM")]
        auto: Vec<String>,
    },
    /// Extract line items from text, photos or PDFs into a batch file
    Extract {
        /// Pasted invoice or message text
        #[arg(long)]
        text: Option<String>,
        /// Image or PDF attachments
        files: Vec<PathBuf>,
        /// Batch file to write
        #[arg(short, long, default_value = "batch.yaml")]
        out: PathBuf,
        /// Batch total in the foreign currency
        #[arg(long, value_parser = parse_amount)]
        total: Option<f64>,
        /// Foreign-to-local exchange rate
        #[arg(long, value_parser = parse_amount)]
        rate: Option<f64>,
        /// Overwrite an existing batch file
        #[arg(long)]
        force: bool,
    },
    /// Show or edit inventory
    Inventory {
        #[command(subcommand)]
        command: Option<InventoryCommands>,
    },
    /// Record a sale
    Sell(SellArgs),
    /// List sales in a window
    Sales {
        /// today, month, year, YYYY-MM, YYYY, <n>d or all
        #[arg(short, long, default_value = "month", value_parser = parse_window)]
        window: DateWindow,
    },
    /// Record or list expenses
    Expense {
        #[command(subcommand)]
        command: ExpenseCommands,
    },
    /// Set or show monthly budgets
    Budget {
        #[command(subcommand)]
        command: BudgetCommands,
    },
    /// Revenue, profit and expenses for a window
    Report {
        /// today, month, year, YYYY-MM, YYYY, <n>d or all
        #[arg(short, long, default_value = "month", value_parser = parse_window)]
        window: DateWindow,
    },
    /// Manage customers
    Customer {
        #[command(subcommand)]
        command: CustomerCommands,
    },
    /// Issue and track invoices
    Invoice {
        #[command(subcommand)]
        command: InvoiceCommands,
    },
    /// Book and track shipments
    Ship {
        #[command(subcommand)]
        command: ShipCommands,
    },
    /// Delete a record
    Delete {
        /// inventory, sale, expense, customer, invoice or shipment
        kind: String,
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Write inventory, sales or expenses to a CSV file
    Export {
        /// inventory, sales or expenses
        dataset: String,
        #[arg(short, long)]
        out: PathBuf,
        /// Tab-separated instead of comma-separated
        #[arg(long)]
        tsv: bool,
    },
    /// Push sales, inventory and expenses to the configured spreadsheet
    Sync,
}

#[derive(Subcommand)]
enum InventoryCommands {
    /// List items in stock
    List,
    /// Add a single item
    Add {
        name: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        /// Landed unit cost in local currency
        #[arg(long, value_parser = parse_amount)]
        cost: f64,
        #[arg(long, value_parser = parse_amount)]
        price: Option<f64>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Change stock by a signed amount
    Adjust {
        item_id: String,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
}

#[derive(Args)]
struct SellArgs {
    item_id: String,
    #[arg(short, long, default_value_t = 1)]
    quantity: u32,
    /// Unit price; defaults to the item's selling price
    #[arg(long, value_parser = parse_amount)]
    price: Option<f64>,
    /// Supply cost per unit; defaults to the configured supplies
    #[arg(long, value_parser = parse_amount)]
    supplies: Option<f64>,
    /// Shipping cost per unit
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    shipping: f64,
    #[arg(long)]
    customer: Option<String>,
}

#[derive(Subcommand)]
enum ExpenseCommands {
    /// Record an expense
    Add {
        category: String,
        #[arg(value_parser = parse_amount)]
        amount: f64,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        note: Option<String>,
    },
    /// List expenses in a window
    List {
        #[arg(short, long, default_value = "month", value_parser = parse_window)]
        window: DateWindow,
    },
}

#[derive(Subcommand)]
enum BudgetCommands {
    /// Set a category's budget for a month
    Set {
        category: String,
        #[arg(value_parser = parse_amount)]
        amount: f64,
        /// YYYY-MM; defaults to the current month
        #[arg(long, value_parser = parse_month)]
        month: Option<(i32, u32)>,
    },
    /// Budget against actual spend for a month
    Show {
        /// YYYY-MM; defaults to the current month
        #[arg(long, value_parser = parse_month)]
        month: Option<(i32, u32)>,
    },
}

#[derive(Subcommand)]
enum CustomerCommands {
    Add {
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    List,
}

#[derive(Subcommand)]
enum InvoiceCommands {
    /// Invoice a customer for one or more sales
    Create {
        customer_id: String,
        #[arg(required = true)]
        sale_ids: Vec<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Mark an invoice paid, by id or number
    Pay { invoice: String },
    List,
}

#[derive(Subcommand)]
enum ShipCommands {
    /// Book a shipment
    Book {
        #[arg(long)]
        sale: Option<String>,
        #[arg(long)]
        courier: String,
        /// Defaults to the sale's customer
        #[arg(long)]
        recipient: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long, value_parser = parse_amount, default_value = "0")]
        fee: f64,
    },
    /// Move a shipment to a new status
    Status {
        shipment_id: String,
        /// booked, in-transit, delivered or cancelled
        #[arg(value_parser = parse_status)]
        status: ShipmentStatus,
        #[arg(long)]
        tracking: Option<String>,
    },
    List,
    /// Print a booking request to paste to the courier
    Note { shipment_id: String },
}

impl TryFrom<Commands> for AppCommand {
    type Error = anyhow::Error;

    fn try_from(cmd: Commands) -> Result<AppCommand> {
        Ok(match cmd {
            Commands::Import {
                batch,
                confirm,
                fetch_rate,
                manual,
                auto,
            } => AppCommand::Import(import::ImportOptions {
                batch_path: batch,
                confirm,
                fetch_rate,
                manual,
                auto,
            }),
            Commands::Extract {
                text,
                files,
                out,
                total,
                rate,
                force,
            } => AppCommand::Extract(extract::ExtractOptions {
                text,
                files,
                out,
                total_cost_foreign: total,
                exchange_rate: rate,
                force,
            }),
            Commands::Inventory { command } => AppCommand::Inventory(match command {
                None | Some(InventoryCommands::List) => InventoryCommand::List,
                Some(InventoryCommands::Add {
                    name,
                    quantity,
                    cost,
                    price,
                    category,
                }) => InventoryCommand::Add(inventory::NewItem {
                    name,
                    quantity,
                    unit_cost: cost,
                    selling_price: price,
                    category,
                }),
                Some(InventoryCommands::Adjust { item_id, delta }) => {
                    InventoryCommand::Adjust { item_id, delta }
                }
            }),
            Commands::Sell(args) => AppCommand::Sell(sales::NewSale {
                item_id: args.item_id,
                quantity: args.quantity,
                unit_price: args.price,
                supply_cost_per_unit: args.supplies,
                shipping_cost_per_unit: args.shipping,
                customer_id: args.customer,
            }),
            Commands::Sales { window } => AppCommand::Sales { window },
            Commands::Expense { command } => AppCommand::Expense(match command {
                ExpenseCommands::Add {
                    category,
                    amount,
                    date,
                    note,
                } => ExpenseCommand::Add(expense::NewExpense {
                    category,
                    amount,
                    date,
                    note,
                }),
                ExpenseCommands::List { window } => ExpenseCommand::List { window },
            }),
            Commands::Budget { command } => AppCommand::Budget(match command {
                BudgetCommands::Set {
                    category,
                    amount,
                    month,
                } => BudgetCommand::Set {
                    category,
                    amount,
                    year: month.map(|(y, _)| y),
                    month: month.map(|(_, m)| m),
                },
                BudgetCommands::Show { month } => BudgetCommand::Show {
                    year: month.map(|(y, _)| y),
                    month: month.map(|(_, m)| m),
                },
            }),
            Commands::Report { window } => AppCommand::Report { window },
            Commands::Customer { command } => AppCommand::Customer(match command {
                CustomerCommands::Add {
                    name,
                    phone,
                    email,
                    address,
                } => CustomerCommand::Add(customer::NewCustomer {
                    name,
                    phone,
                    email,
                    address,
                }),
                CustomerCommands::List => CustomerCommand::List,
            }),
            Commands::Invoice { command } => AppCommand::Invoice(match command {
                InvoiceCommands::Create {
                    customer_id,
                    sale_ids,
                    date,
                } => InvoiceCommand::Create {
                    customer_id,
                    sale_ids,
                    issued_on: date,
                },
                InvoiceCommands::Pay { invoice } => InvoiceCommand::Pay { invoice },
                InvoiceCommands::List => InvoiceCommand::List,
            }),
            Commands::Ship { command } => AppCommand::Ship(match command {
                ShipCommands::Book {
                    sale,
                    courier,
                    recipient,
                    address,
                    phone,
                    fee,
                } => ShipCommand::Book(ship::NewShipment {
                    sale_id: sale,
                    courier,
                    recipient,
                    address,
                    phone,
                    fee,
                }),
                ShipCommands::Status {
                    shipment_id,
                    status,
                    tracking,
                } => ShipCommand::Status {
                    shipment_id,
                    status,
                    tracking_number: tracking,
                },
                ShipCommands::List => ShipCommand::List,
                ShipCommands::Note { shipment_id } => ShipCommand::Note { shipment_id },
            }),
            Commands::Delete { kind, id, yes } => AppCommand::Delete {
                target: RecordRef::parse(&kind, &id)?,
                yes,
            },
            Commands::Export { dataset, out, tsv } => AppCommand::Export {
                dataset: dataset.parse()?,
                out,
                tsv,
            },
            Commands::Sync => AppCommand::Sync,
            Commands::Setup => anyhow::bail!("Setup command should be handled separately"),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => shopkeep::cli::setup::setup(),
        Some(cmd) => match AppCommand::try_from(cmd) {
            Ok(command) => shopkeep::run_command(command, cli.config_path.as_deref()).await,
            Err(e) => Err(e),
        },
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
