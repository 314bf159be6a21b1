//! Remote reads against the SharePoint REST API.
//!
//! None of these return an error to the caller. The annotation read keeps the
//! failure in [`AnnotationLookup::FetchFailed`] so callers can tell it apart
//! from a row that simply has no comments; the item reads fall back to
//! defaults.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{
    client::{ListContext, SpHttpClient},
    config::{AdminFields, TimeDisplay},
    error::FetchError,
    AdministratorPair, Annotation, RowId,
};

/// Shown when the last editor has neither email nor display name.
pub const NO_EDITOR: &str = "No editor";

/// Outcome of reading the latest comment on a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationLookup {
    /// The newest comment.
    Found(Annotation),
    /// The row has no comments.
    NoAnnotation,
    /// The read failed; rendered like [`AnnotationLookup::NoAnnotation`].
    FetchFailed(FetchError),
}

impl AnnotationLookup {
    /// The annotation, if one was found.
    pub fn into_annotation(self) -> Option<Annotation> {
        match self {
            Self::Found(annotation) => Some(annotation),
            Self::NoAnnotation | Self::FetchFailed(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommentsResponse {
    #[serde(default)]
    value: Vec<CommentRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentRecord {
    created_date: String,
    #[serde(default)]
    author: Option<CommentAuthor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentAuthor {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Latest comment on `row`, newest first, one result.
pub async fn fetch_latest_annotation(
    client: &dyn SpHttpClient,
    list: &ListContext,
    row: RowId,
    time: &TimeDisplay,
) -> AnnotationLookup {
    match try_fetch_latest_annotation(client, list, row, time).await {
        Ok(Some(annotation)) => AnnotationLookup::Found(annotation),
        Ok(None) => AnnotationLookup::NoAnnotation,
        Err(err) => AnnotationLookup::FetchFailed(err),
    }
}

async fn try_fetch_latest_annotation(
    client: &dyn SpHttpClient,
    list: &ListContext,
    row: RowId,
    time: &TimeDisplay,
) -> Result<Option<Annotation>, FetchError> {
    let mut url = list.comments_url(row)?;
    url.query_pairs_mut()
        .append_pair("$expand", "author")
        .append_pair("$orderby", "createdDate desc")
        .append_pair("$top", "1");

    let body = client.get_json(url.clone()).await?;
    let response: CommentsResponse =
        serde_json::from_value(body).map_err(|err| decode_error(&url, err))?;
    let Some(record) = response.value.into_iter().next() else {
        return Ok(None);
    };

    let created_at = DateTime::parse_from_rfc3339(record.created_date.trim())
        .map_err(|err| {
            decode_error(&url, format!("createdDate `{}`: {err}", record.created_date))
        })?
        .with_timezone(&Utc);
    let author = record.author.unwrap_or_default();
    let full_name = format!(
        "{} {}",
        author.first_name.unwrap_or_default(),
        author.last_name.unwrap_or_default()
    );

    Ok(Some(Annotation {
        author_full_name: full_name.trim().to_string(),
        author_email: author.email.unwrap_or_default(),
        created_at,
        created_display: time.format(created_at),
    }))
}

/// The two administrator person fields of `row`. Anything unreadable becomes
/// an empty email.
pub async fn fetch_administrators(
    client: &dyn SpHttpClient,
    list: &ListContext,
    row: RowId,
    fields: &AdminFields,
) -> AdministratorPair {
    let select = format!("{}/EMail,{}/EMail", fields.first, fields.second);
    let expand = format!("{},{}", fields.first, fields.second);
    match fetch_item(client, list, row, &select, &expand).await {
        Ok(item) => AdministratorPair {
            admin1_email: person_property(&item, &fields.first, "EMail").unwrap_or_default(),
            admin2_email: person_property(&item, &fields.second, "EMail").unwrap_or_default(),
        },
        Err(err) => {
            tracing::warn!(row_id = %row, error = %err, "administrator fields unavailable");
            AdministratorPair::default()
        },
    }
}

/// Identity of the user who last modified `row`: email, else display name,
/// else [`NO_EDITOR`].
pub async fn fetch_last_editor(
    client: &dyn SpHttpClient,
    list: &ListContext,
    row: RowId,
) -> String {
    match fetch_item(client, list, row, "Editor/EMail,Editor/Title", "Editor").await {
        Ok(item) => {
            let editor = item.get("Editor").unwrap_or(&Value::Null);
            tracing::debug!(row_id = %row, %editor, "last editor fields");
            person_property(&item, "Editor", "EMail")
                .or_else(|| person_property(&item, "Editor", "Title"))
                .unwrap_or_else(|| NO_EDITOR.to_string())
        },
        Err(err) => {
            tracing::warn!(row_id = %row, error = %err, "last editor unavailable");
            NO_EDITOR.to_string()
        },
    }
}

async fn fetch_item(
    client: &dyn SpHttpClient,
    list: &ListContext,
    row: RowId,
    select: &str,
    expand: &str,
) -> Result<Value, FetchError> {
    let mut url = list.item_url(row)?;
    url.query_pairs_mut()
        .append_pair("$select", select)
        .append_pair("$expand", expand);
    let item = client.get_json(url.clone()).await?;
    if !item.is_object() {
        return Err(decode_error(&url, "item response is not an object"));
    }
    Ok(item)
}

fn person_property(item: &Value, field: &str, property: &str) -> Option<String> {
    item.get(field)
        .and_then(|person| person.get(property))
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn decode_error(url: &Url, message: impl ToString) -> FetchError {
    FetchError::Decode {
        url: url.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::person_property;

    #[test]
    fn person_property_reads_expanded_field() {
        let item = json!({ "admin_1": { "EMail": "boss@x.com" }, "admin_2": null });
        assert_eq!(person_property(&item, "admin_1", "EMail").as_deref(), Some("boss@x.com"));
        assert_eq!(person_property(&item, "admin_2", "EMail"), None);
        assert_eq!(person_property(&item, "admin_3", "EMail"), None);
    }

    #[test]
    fn person_property_ignores_empty_and_non_string_values() {
        let item = json!({ "Editor": { "EMail": "", "Title": 42 } });
        assert_eq!(person_property(&item, "Editor", "EMail"), None);
        assert_eq!(person_property(&item, "Editor", "Title"), None);
    }
}
