//! In-memory stand-ins for the host collaborators.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use last_commenter_renderer::{
    client::{ListContext, SpHttpClient},
    config::{PipelineVariant, RendererConfig, TimeDisplay},
    error::FetchError,
    identifier::RowMetadata,
    render::{CellEvent, CellTarget},
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use url::Url;

pub const LIST_ID: &str = "6f1f0a52-0000-4000-8000-00000000beef";
pub const WEB_URL: &str = "https://contoso.sharepoint.com/sites/ops";

#[derive(Default)]
pub struct FakeSharePoint {
    comments: Mutex<HashMap<u64, Result<Value, FetchError>>>,
    items: Mutex<HashMap<u64, Result<Value, FetchError>>>,
    panicking_rows: Mutex<HashSet<u64>>,
    calls: Mutex<Vec<Url>>,
}

impl FakeSharePoint {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_comment(&self, row: u64, first: &str, last: &str, email: &str, created: &str) {
        self.comments.lock().insert(
            row,
            Ok(json!({
                "value": [{
                    "createdDate": created,
                    "author": { "firstName": first, "lastName": last, "email": email }
                }]
            })),
        );
    }

    pub fn with_comments_response(&self, row: u64, response: Result<Value, FetchError>) {
        self.comments.lock().insert(row, response);
    }

    pub fn with_item(&self, row: u64, item: Value) {
        self.items.lock().insert(row, Ok(item));
    }

    pub fn with_item_response(&self, row: u64, response: Result<Value, FetchError>) {
        self.items.lock().insert(row, response);
    }

    pub fn panic_on(&self, row: u64) {
        self.panicking_rows.lock().insert(row);
    }

    pub fn calls(&self) -> Vec<Url> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_for_row(&self, row: u64) -> usize {
        let marker = format!("/items({row})");
        self.calls
            .lock()
            .iter()
            .filter(|url| url.path().contains(&marker))
            .count()
    }
}

#[async_trait]
impl SpHttpClient for FakeSharePoint {
    async fn get_json(&self, url: Url) -> Result<Value, FetchError> {
        self.calls.lock().push(url.clone());
        tokio::task::yield_now().await;

        let row = row_from_path(url.path());
        if self.panicking_rows.lock().contains(&row) {
            panic!("fake sharepoint exploded for row {row}");
        }
        if url.path().ends_with("/Comments") {
            self.comments
                .lock()
                .get(&row)
                .cloned()
                .unwrap_or_else(|| Ok(json!({ "value": [] })))
        } else {
            self.items
                .lock()
                .get(&row)
                .cloned()
                .unwrap_or_else(|| Ok(json!({})))
        }
    }
}

fn row_from_path(path: &str) -> u64 {
    path.split("/items(")
        .nth(1)
        .and_then(|rest| rest.split(')').next())
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

/// Cell element that records what was written into it.
pub struct RecordingCell {
    html: Mutex<Vec<String>>,
    mounted: Mutex<bool>,
}

impl RecordingCell {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            html: Mutex::new(Vec::new()),
            mounted: Mutex::new(true),
        })
    }

    pub fn unmount(&self) {
        *self.mounted.lock() = false;
    }

    pub fn html(&self) -> String {
        self.html.lock().last().cloned().unwrap_or_default()
    }

    pub fn writes(&self) -> Vec<String> {
        self.html.lock().clone()
    }
}

impl CellTarget for RecordingCell {
    fn set_inner_html(&self, html: &str) {
        self.html.lock().push(html.to_string());
    }

    fn is_mounted(&self) -> bool {
        *self.mounted.lock()
    }
}

pub struct MapRow(pub HashMap<String, Value>);

impl RowMetadata for MapRow {
    fn value_by_name(&self, name: &str) -> anyhow::Result<Option<Value>> {
        Ok(self.0.get(name).cloned())
    }
}

/// Row accessor that panics on every lookup.
pub struct PanickingRow;

impl RowMetadata for PanickingRow {
    fn value_by_name(&self, name: &str) -> anyhow::Result<Option<Value>> {
        panic!("row accessor exploded on {name}")
    }
}

/// Cell that panics when handed markup containing `poison`, and records
/// every other write.
pub struct PoisonedCell {
    pub poison: &'static str,
    pub inner: Arc<RecordingCell>,
}

impl CellTarget for PoisonedCell {
    fn set_inner_html(&self, html: &str) {
        if html.contains(self.poison) {
            panic!("cell refused {html}");
        }
        self.inner.set_inner_html(html);
    }
}

pub fn list() -> ListContext {
    ListContext::new(WEB_URL, Some(LIST_ID.to_string()))
}

pub fn config(variant: PipelineVariant) -> RendererConfig {
    RendererConfig {
        variant,
        time_display: TimeDisplay::utc(),
        ..RendererConfig::default()
    }
}

pub fn event(field_value: Value, cell: &Arc<RecordingCell>) -> CellEvent {
    CellEvent {
        field_value,
        row: None,
        page_url: None,
        target: cell.clone(),
    }
}
