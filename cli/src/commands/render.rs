use std::{env, sync::Arc};

use anyhow::{bail, Result};
use last_commenter_renderer::{
    client::{ListContext, ReqwestSpClient},
    config::PipelineVariant,
    render::{CellEvent, CellTarget, RenderStateController},
};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use super::{config, print_json};

const TOKEN_ENV: &str = "SHAREPOINT_TOKEN";

pub struct RenderArgs {
    pub web_url: String,
    pub list_id: Option<String>,
    pub token: Option<String>,
    pub variant: Option<PipelineVariant>,
    pub page_url: Option<String>,
    pub passes: u32,
    pub rows: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RenderLine<'a> {
    pass: u32,
    input: &'a str,
    outcome: &'static str,
    html: String,
}

/// Cell that keeps the last markup written into it.
#[derive(Default)]
struct CapturedCell {
    html: Mutex<String>,
}

impl CellTarget for CapturedCell {
    fn set_inner_html(&self, html: &str) {
        *self.html.lock() = html.to_string();
    }
}

pub async fn run(args: RenderArgs) -> Result<()> {
    if args.passes == 0 {
        bail!("--passes must be at least 1");
    }

    let config = config::load(args.variant)?;
    let token = args.token.or_else(|| env::var(TOKEN_ENV).ok());
    if token.is_none() {
        tracing::warn!("no bearer token given; requests are sent anonymously");
    }
    let client = ReqwestSpClient::new(config.http_timeout, token)?;
    let controller = RenderStateController::new(
        Arc::new(client),
        ListContext::new(args.web_url, args.list_id),
        config,
    );

    for pass in 1..=args.passes {
        let mut pending = Vec::with_capacity(args.rows.len());
        for input in &args.rows {
            let cell = Arc::new(CapturedCell::default());
            let outcome = controller.render_cell(CellEvent {
                field_value: field_value(input),
                row: None,
                page_url: args.page_url.clone(),
                target: cell.clone(),
            });
            pending.push((input.as_str(), outcome.label(), cell, outcome));
        }

        for (input, label, cell, outcome) in pending {
            outcome.settle().await?;
            let html = cell.html.lock().clone();
            print_json(&RenderLine {
                pass,
                input,
                outcome: label,
                html,
            })?;
        }
        tracing::info!(pass, cached_rows = controller.cache().len(), "render pass finished");
    }

    Ok(())
}

/// Numeric arguments become JSON numbers, as an `ID` column would deliver
/// them; everything else stays text.
fn field_value(input: &str) -> Value {
    match input.trim().parse::<u64>() {
        Ok(number) => Value::from(number),
        Err(_) => Value::String(input.to_string()),
    }
}
