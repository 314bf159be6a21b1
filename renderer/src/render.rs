//! Cell render state machine: loading, no id, error, or resolved content.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use anyhow::{Context, Result};
use futures::FutureExt;
use serde_json::Value;
use tokio::{runtime::Handle, task::JoinHandle};

use crate::{
    cache::CommenterCache,
    client::{ListContext, SpHttpClient},
    config::RendererConfig,
    identifier::{self, RowMetadata},
    pipeline::CommentResolutionPipeline,
    CellState, ResolvedPayload, RowId,
};

/// DOM-like element the host hands over for one cell.
pub trait CellTarget: Send + Sync {
    /// Replaces the element's content with `html`.
    fn set_inner_html(&self, html: &str);

    /// `false` once the host has disposed of the element.
    fn is_mounted(&self) -> bool {
        true
    }
}

/// Everything the host passes for one cell render.
pub struct CellEvent {
    /// Raw value of the bound field.
    pub field_value: Value,
    /// Other columns of the row, when the host exposes them.
    pub row: Option<Arc<dyn RowMetadata>>,
    /// Address of the page hosting the list view.
    pub page_url: Option<String>,
    /// Element the cell is drawn into.
    pub target: Arc<dyn CellTarget>,
}

/// Result of a cell resolution task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCompletion {
    /// Row the cell was resolved for.
    pub row: RowId,
    /// Payload stored in the cache for that row.
    pub payload: ResolvedPayload,
    /// Whether the cell was still mounted and received the payload.
    pub applied: bool,
}

/// What [`RenderStateController::render_cell`] did with a cell.
#[derive(Debug)]
pub enum RenderOutcome {
    /// No row identifier; the "No ID" marker was written.
    NoId,
    /// Cache hit; the payload was written synchronously.
    Cached(ResolvedPayload),
    /// Loading marker written; the task writes the payload when it finishes.
    Loading(JoinHandle<RenderCompletion>),
    /// Dispatch failed; the "Error" marker was written.
    Error,
}

impl RenderOutcome {
    /// Waits for a loading cell and returns the state it ends in.
    pub async fn settle(self) -> Result<CellState> {
        match self {
            Self::NoId => Ok(CellState::NoId),
            Self::Error => Ok(CellState::Error),
            Self::Cached(payload) => Ok(CellState::Resolved {
                payload,
            }),
            Self::Loading(handle) => {
                let completion = handle.await.context("cell resolution task failed")?;
                Ok(CellState::Resolved {
                    payload: completion.payload,
                })
            },
        }
    }

    /// Short name of the outcome for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoId => "no_id",
            Self::Cached(_) => "cached",
            Self::Loading(_) => "loading",
            Self::Error => "error",
        }
    }
}

/// Drives each cell from loading to its resolved content. One controller owns
/// one cache for its whole lifetime.
pub struct RenderStateController {
    pipeline: CommentResolutionPipeline,
    cache: Arc<CommenterCache>,
}

impl RenderStateController {
    /// Builds a controller with an empty cache sized from `config`.
    pub fn new(client: Arc<dyn SpHttpClient>, list: ListContext, config: RendererConfig) -> Self {
        let cache = Arc::new(CommenterCache::new(config.cache_capacity));
        tracing::info!(
            variant = %config.variant,
            cache_capacity = config.cache_capacity.get(),
            list_id = list.list_id.as_deref().unwrap_or("-"),
            "last commenter renderer ready"
        );
        Self {
            pipeline: CommentResolutionPipeline::new(client, list, Arc::new(config)),
            cache,
        }
    }

    /// Cache shared by every cell this controller renders.
    pub fn cache(&self) -> &CommenterCache {
        &self.cache
    }

    /// Renders one cell. Cache hits and identifier failures are written
    /// before returning; misses show the loading marker and finish on a task
    /// spawned on the current Tokio runtime. A panic from a host callback
    /// during dispatch leaves the cell on the "Error" marker.
    pub fn render_cell(&self, event: CellEvent) -> RenderOutcome {
        let target = event.target.clone();
        match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(event))) {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!("cell render panicked, showing error marker");
                let marked = panic::catch_unwind(AssertUnwindSafe(|| {
                    target.set_inner_html(&CellState::Error.to_html());
                }));
                if marked.is_err() {
                    tracing::error!("cell rejected the error marker");
                }
                RenderOutcome::Error
            },
        }
    }

    fn dispatch(&self, event: CellEvent) -> RenderOutcome {
        let CellEvent {
            field_value,
            row,
            page_url,
            target,
        } = event;

        let row_id =
            match identifier::resolve_row_id(&field_value, row.as_deref(), page_url.as_deref()) {
                Ok(row_id) => row_id,
                Err(err) => {
                    tracing::debug!(field_value = %field_value, "{err}");
                    target.set_inner_html(&CellState::NoId.to_html());
                    return RenderOutcome::NoId;
                },
            };

        if let Some(payload) = self.cache.get(row_id) {
            target.set_inner_html(&resolved_html(&payload));
            return RenderOutcome::Cached(payload);
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!(row_id = %row_id, error = %err, "cannot schedule cell resolution");
                target.set_inner_html(&CellState::Error.to_html());
                return RenderOutcome::Error;
            },
        };

        target.set_inner_html(&CellState::Loading.to_html());
        let pipeline = self.pipeline.clone();
        let pending = self.cache.join_or_start(row_id, move || {
            async move { pipeline.resolve(row_id).await }.boxed()
        });

        let handle = runtime.spawn(async move {
            let payload = pending.await;
            let applied = target.is_mounted();
            if applied {
                target.set_inner_html(&resolved_html(&payload));
            } else {
                tracing::debug!(row_id = %row_id, "cell disposed before resolution, result dropped");
            }
            RenderCompletion {
                row: row_id,
                payload,
                applied,
            }
        });
        RenderOutcome::Loading(handle)
    }
}

fn resolved_html(payload: &ResolvedPayload) -> String {
    crate::markup::payload(payload)
}
