use shopkeep::cli::export::Dataset;
use shopkeep::cli::{import, sales};
use shopkeep::core::config::AppConfig;
use shopkeep::core::reporting::DateWindow;
use shopkeep::{AppCommand, BudgetCommand, ExpenseCommand, InventoryCommand};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_rate_server(symbol: &str, rate: f64) -> MockServer {
        let mock_server = MockServer::start().await;
        let body = format!(r#"{{"chart": {{"result": [{{"meta": {{"regularMarketPrice": {rate}}}}}]}}}}"#);

        Mock::given(method("GET"))
            .and(path(format!("/v8/finance/chart/{symbol}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub async fn create_sync_server(status: u16, expected_calls: u64) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/exec"))
            .respond_with(ResponseTemplate::new(status))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;

        mock_server
    }
}

fn write_config(dir: &Path, extra: &str) -> String {
    let config_path = dir.join("config.yaml");
    let config_content = format!(
        r#"
currency: "PHP"
foreign_currency: "USD"
supplies:
  cost_per_unit: 2.5
  units_per_item: 2
data_path: "{}"
{extra}
"#,
        dir.join("data").display()
    );
    fs::write(&config_path, config_content).expect("Failed to write config file");
    config_path.to_string_lossy().into_owned()
}

fn write_batch(dir: &Path) -> std::path::PathBuf {
    let batch_path = dir.join("batch.yaml");
    fs::write(
        &batch_path,
        r#"
total_cost_foreign: 300
items:
  - id: jacket
    name: Denim jacket
    quantity: 2
    category: Apparel
    selling_price: 9000
  - id: lamp
    name: Brass lamp
    is_manual_cost: true
    manual_unit_cost_foreign: 100
    category: Home
"#,
    )
    .expect("Failed to write batch file");
    batch_path
}

fn load_state(config_path: &str) -> shopkeep::core::AppState {
    let config = AppConfig::load_from_path(config_path).unwrap();
    shopkeep::store::open_state_store(&config)
        .unwrap()
        .load()
        .unwrap()
}

async fn run(command: AppCommand, config_path: &str) {
    let result = shopkeep::run_command(command, Some(config_path)).await;
    assert!(result.is_ok(), "Command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_import_sell_report_flow() {
    let dir = TempDir::new().unwrap();
    let rate_server = test_utils::create_rate_server("USDPHP=X", 50.0).await;
    let config_path = write_config(
        dir.path(),
        &format!("providers:\n  rates:\n    base_url: \"{}\"", rate_server.uri()),
    );
    let batch_path = write_batch(dir.path());

    run(
        AppCommand::Import(import::ImportOptions {
            batch_path,
            confirm: true,
            fetch_rate: true,
            manual: vec![],
            auto: vec![],
        }),
        &config_path,
    )
    .await;

    let state = load_state(&config_path);
    info!(items = state.inventory.len(), "Imported");
    // 200 left after the lamp, split over two jackets, at 50 plus 5 of supplies.
    assert_eq!(state.item("jacket").unwrap().unit_cost, 5_005.0);
    assert_eq!(state.item("lamp").unwrap().unit_cost, 5_005.0);

    run(
        AppCommand::Sell(sales::NewSale {
            item_id: "jacket".to_string(),
            quantity: 1,
            unit_price: None,
            supply_cost_per_unit: None,
            shipping_cost_per_unit: 0.0,
            customer_id: None,
        }),
        &config_path,
    )
    .await;
    run(
        AppCommand::Expense(ExpenseCommand::Add(shopkeep::cli::expense::NewExpense {
            category: "Ads".to_string(),
            amount: 500.0,
            date: None,
            note: None,
        })),
        &config_path,
    )
    .await;
    run(
        AppCommand::Budget(BudgetCommand::Show {
            year: None,
            month: None,
        }),
        &config_path,
    )
    .await;
    run(
        AppCommand::Report {
            window: DateWindow::ThisMonth,
        },
        &config_path,
    )
    .await;
    run(AppCommand::Inventory(InventoryCommand::List), &config_path).await;

    let state = load_state(&config_path);
    assert_eq!(state.item("jacket").unwrap().quantity, 1);
    assert_eq!(state.sales.len(), 1);
    assert_eq!(state.sales[0].total_amount, 9000.0);
    assert_eq!(state.sales[0].supply_cost_per_unit, 5.0);
    assert_eq!(state.expenses.len(), 1);

    let out = dir.path().join("sales.csv");
    run(
        AppCommand::Export {
            dataset: Dataset::Sales,
            out: out.clone(),
            tsv: false,
        },
        &config_path,
    )
    .await;
    let csv = fs::read_to_string(&out).unwrap();
    assert!(csv.contains("Denim jacket"));
    assert!(csv.contains("3990.0"));
}

#[test_log::test(tokio::test)]
async fn test_preview_leaves_inventory_empty() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(dir.path(), "exchange_rate: 58.0");
    let batch_path = write_batch(dir.path());

    run(
        AppCommand::Import(import::ImportOptions {
            batch_path,
            confirm: false,
            fetch_rate: false,
            manual: vec![],
            auto: vec![],
        }),
        &config_path,
    )
    .await;

    assert!(load_state(&config_path).inventory.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_sync_pushes_every_sheet() {
    let dir = TempDir::new().unwrap();
    let sync_server = test_utils::create_sync_server(200, 3).await;
    let config_path = write_config(
        dir.path(),
        &format!(
            "providers:\n  sync:\n    endpoint: \"{}/exec\"",
            sync_server.uri()
        ),
    );

    run(AppCommand::Sync, &config_path).await;
}

#[test_log::test(tokio::test)]
async fn test_sync_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let sync_server = test_utils::create_sync_server(500, 3).await;
    let config_path = write_config(
        dir.path(),
        &format!(
            "providers:\n  sync:\n    endpoint: \"{}/exec\"",
            sync_server.uri()
        ),
    );

    let result = shopkeep::run_command(AppCommand::Sync, Some(&config_path)).await;
    let err = result.unwrap_err().to_string();
    assert!(err.starts_with("Sync failed: "), "unexpected error: {err}");
}

#[test_log::test(tokio::test)]
async fn test_sync_requires_endpoint() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(dir.path(), "");

    let result = shopkeep::run_command(AppCommand::Sync, Some(&config_path)).await;
    assert_eq!(
        result.unwrap_err().to_string(),
        "No sync endpoint configured"
    );
}
