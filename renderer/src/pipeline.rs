//! Resolution of one row into the payload shown in its cell.

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;

use crate::{
    client::{ListContext, SpHttpClient},
    config::{PipelineVariant, RendererConfig},
    fetchers::{self, AnnotationLookup},
    AdministratorPair, Annotation, ResolvedPayload, RowId,
};

/// Folds the latest annotation (and, depending on the variant, the row's
/// administrators or last editor) into one payload.
#[derive(Clone)]
pub struct CommentResolutionPipeline {
    client: Arc<dyn SpHttpClient>,
    list: Arc<ListContext>,
    config: Arc<RendererConfig>,
}

impl CommentResolutionPipeline {
    /// Pipeline reading `list` through `client`.
    pub fn new(
        client: Arc<dyn SpHttpClient>,
        list: ListContext,
        config: Arc<RendererConfig>,
    ) -> Self {
        Self {
            client,
            list: Arc::new(list),
            config,
        }
    }

    /// Variant chosen by the configuration.
    pub fn variant(&self) -> PipelineVariant {
        self.config.variant
    }

    /// Never fails: fetch errors degrade inside the steps and a panic in any
    /// step yields [`ResolvedPayload::Empty`].
    pub async fn resolve(&self, row: RowId) -> ResolvedPayload {
        match AssertUnwindSafe(self.resolve_steps(row)).catch_unwind().await {
            Ok(payload) => payload,
            Err(_) => {
                tracing::error!(row_id = %row, "comment resolution panicked");
                ResolvedPayload::Empty
            },
        }
    }

    async fn resolve_steps(&self, row: RowId) -> ResolvedPayload {
        let client = self.client.as_ref();
        let variant = self.config.variant;
        tracing::debug!(row_id = %row, %variant, "resolving last commenter");

        let (lookup, admins) = match variant {
            PipelineVariant::AdminMatch => {
                let (lookup, admins) = tokio::join!(
                    fetchers::fetch_latest_annotation(
                        client,
                        &self.list,
                        row,
                        &self.config.time_display
                    ),
                    fetchers::fetch_administrators(
                        client,
                        &self.list,
                        row,
                        &self.config.admin_fields
                    ),
                );
                (lookup, Some(admins))
            },
            PipelineVariant::EmailOnly | PipelineVariant::LastEditor => {
                let lookup = fetchers::fetch_latest_annotation(
                    client,
                    &self.list,
                    row,
                    &self.config.time_display,
                )
                .await;
                (lookup, None)
            },
        };

        if let AnnotationLookup::FetchFailed(err) = &lookup {
            tracing::warn!(row_id = %row, error = %err, "latest comment unavailable");
        }

        match lookup.into_annotation() {
            Some(annotation) => compose(&annotation, admins.as_ref()),
            None if variant == PipelineVariant::LastEditor => {
                let editor = fetchers::fetch_last_editor(client, &self.list, row).await;
                ResolvedPayload::text(editor)
            },
            None => ResolvedPayload::Empty,
        }
    }
}

/// Payload for a row that has a comment. `admins` is present only when the
/// admin comparison is active.
pub fn compose(annotation: &Annotation, admins: Option<&AdministratorPair>) -> ResolvedPayload {
    let mut lines = vec![
        format!("at: {}", annotation.created_display),
        format!("by: {} {}", annotation.author_full_name, annotation.author_email),
    ];
    let admin_match = admins.map(|pair| is_admin_match(&annotation.author_email, pair));
    if let Some(matched) = admin_match {
        lines.push(format!("admin: {}", if matched { "yes" } else { "no" }));
    }
    ResolvedPayload::Content {
        lines,
        admin_match,
    }
}

/// Exact, case-sensitive email comparison against both slots.
// TODO: decide with list owners whether admin emails should compare
// case-insensitively; SharePoint returns both spellings for the same account.
pub fn is_admin_match(author_email: &str, admins: &AdministratorPair) -> bool {
    admins.matches(author_email)
}
