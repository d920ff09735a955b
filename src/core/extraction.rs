//! Turning pasted text, photos and PDFs into draft line items.
//!
//! The extraction service is an external collaborator; it may omit any
//! field. [`into_drafts`] fills the gaps so the allocation engine always
//! receives well-formed items.

use crate::core::allocation::DraftLineItem;
use crate::core::money::{self, lenient};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    /// Reads an image or PDF, inferring the MIME type from the extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let mime_type = match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            "heic" => "image/heic",
            "pdf" => "application/pdf",
            _ => return Err(anyhow!("Unsupported attachment type: {}", path.display())),
        };
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read attachment: {}", path.display()))?;
        Ok(Self {
            mime_type: mime_type.to_string(),
            data,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionRequest {
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl ExtractionRequest {
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(|t| t.trim().is_empty()) && self.attachments.is_empty()
    }
}

/// One candidate item as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "lenient")]
    pub quantity: Option<f64>,
    #[serde(default, with = "lenient", alias = "estimated_value")]
    pub estimated_relative_value: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> Result<Vec<ExtractedItem>>;
}

/// Converts candidates into automatic-cost drafts.
///
/// Missing names become `Item N` (1-based position), missing or
/// non-positive quantities become 1, and fractional quantities round to the
/// nearest whole unit.
pub fn into_drafts(items: Vec<ExtractedItem>) -> Vec<DraftLineItem> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let name = item
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Item {}", index + 1));
            let quantity = money::finite(item.quantity)
                .map(|q| q.round())
                .filter(|q| *q >= 1.0)
                .map(|q| q.min(f64::from(u32::MAX)) as u32)
                .unwrap_or(1);

            let mut draft = DraftLineItem::new(&name, quantity);
            draft.estimated_relative_value =
                money::finite(item.estimated_relative_value).filter(|v| *v >= 0.0);
            draft.category = item.category.filter(|c| !c.trim().is_empty());
            draft
        })
        .collect()
}
