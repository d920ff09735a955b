use super::{import, ui};
use crate::core::allocation::CostBatch;
use crate::core::extraction::{Attachment, ExtractionRequest, ExtractionService, into_drafts};
use anyhow::{Result, bail};
use comfy_table::Cell;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct ExtractOptions {
    pub text: Option<String>,
    pub files: Vec<PathBuf>,
    pub out: PathBuf,
    pub total_cost_foreign: Option<f64>,
    pub exchange_rate: Option<f64>,
    pub force: bool,
}

pub fn build_request(text: Option<String>, files: &[PathBuf]) -> Result<ExtractionRequest> {
    let attachments = files
        .iter()
        .map(Attachment::from_path)
        .collect::<Result<Vec<_>>>()?;
    let request = ExtractionRequest {
        text: super::non_blank(text),
        attachments,
    };
    if request.is_empty() {
        bail!("Nothing to extract: pass --text or at least one file");
    }
    Ok(request)
}

fn render_drafts(batch: &CostBatch, out: &Path) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Item"),
        ui::header_cell("Qty"),
        ui::header_cell("Category"),
        ui::header_cell("Est. value"),
    ]);
    for item in &batch.items {
        table.add_row(vec![
            Cell::new(&item.name),
            ui::count_cell(item.quantity),
            Cell::new(item.category.as_deref().unwrap_or("")),
            ui::format_optional_cell(item.estimated_relative_value, |v| format!("{v:.2}")),
        ]);
    }
    format!(
        "{}\n\n{}\n\nEdit {} then run `shopkeep import {}`",
        ui::style_text("Extracted items", ui::StyleType::Title),
        table,
        out.display(),
        out.display()
    )
}

pub async fn run(service: &dyn ExtractionService, options: ExtractOptions) -> Result<()> {
    if options.out.exists() && !options.force {
        bail!(
            "Batch file already exists at {} (use --force to overwrite)",
            options.out.display()
        );
    }
    let request = build_request(options.text, &options.files)?;

    let pb = ui::new_spinner("Extracting line items...");
    let extracted = service.extract(&request).await;
    pb.finish_and_clear();
    let extracted = extracted?;

    if extracted.is_empty() {
        bail!("The extraction service found no items");
    }

    let batch = CostBatch {
        total_cost_foreign: options.total_cost_foreign,
        exchange_rate: options.exchange_rate,
        supply_cost_per_item_local: None,
        items: into_drafts(extracted),
    };
    import::save_batch(&options.out, &batch)?;
    info!(items = batch.items.len(), "Wrote batch {}", options.out.display());
    println!("{}", render_drafts(&batch, &options.out));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extraction::ExtractedItem;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct CannedExtraction(Vec<ExtractedItem>);

    #[async_trait]
    impl ExtractionService for CannedExtraction {
        async fn extract(&self, _request: &ExtractionRequest) -> Result<Vec<ExtractedItem>> {
            Ok(self.0.clone())
        }
    }

    fn options(out: PathBuf) -> ExtractOptions {
        ExtractOptions {
            text: Some("2 lamps and a vase".to_string()),
            files: vec![],
            out,
            total_cost_foreign: Some(90.0),
            exchange_rate: None,
            force: false,
        }
    }

    #[tokio::test]
    async fn test_writes_editable_batch() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("batch.yaml");
        let service = CannedExtraction(vec![
            ExtractedItem {
                name: Some("Lamp".to_string()),
                quantity: Some(2.0),
                ..ExtractedItem::default()
            },
            ExtractedItem::default(),
        ]);

        run(&service, options(out.clone())).await.unwrap();

        let batch = import::load_batch(&out).unwrap();
        assert_eq!(batch.total_cost_foreign, Some(90.0));
        assert_eq!(batch.items.len(), 2);
        assert_eq!(batch.items[0].quantity, 2);
        assert_eq!(batch.items[1].name, "Item 2");
        assert!(batch.items.iter().all(|i| !i.is_manual_cost));
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("batch.yaml");
        std::fs::write(&out, "items: []").unwrap();
        let service = CannedExtraction(vec![ExtractedItem::default()]);

        let err = run(&service, options(out.clone())).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "items: []");
    }

    #[test]
    fn test_empty_request_is_rejected() {
        assert!(build_request(Some("   ".to_string()), &[]).is_err());
        assert!(build_request(None, &[PathBuf::from("notes.txt")]).is_err());
    }
}
