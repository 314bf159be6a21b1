//! Data model shared between the cell renderer and its hosts.
//!
//! Everything here is plain data: row identifiers, the latest annotation on a
//! row, the administrator pair configured on it and the payload finally shown
//! in the cell. Fetching and caching live in `last-commenter-renderer`.

pub mod markup;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of one list item.
///
/// Zero is never a valid SharePoint item id, so it is rejected at
/// construction time the same way a missing id is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(u64);

impl RowId {
    /// Builds a row id, returning `None` for zero.
    pub fn new(value: u64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Latest comment left on a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// `"{first} {last}"` with surrounding whitespace trimmed.
    pub author_full_name: String,
    /// Author email, empty when the service did not return one.
    pub author_email: String,
    /// When the comment was posted.
    pub created_at: DateTime<Utc>,
    /// `created_at` rendered in the viewer's display zone and pattern.
    pub created_display: String,
}

/// The two administrator identities configured on a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdministratorPair {
    /// Email of the first administrator field, empty when unset.
    pub admin1_email: String,
    /// Email of the second administrator field, empty when unset.
    pub admin2_email: String,
}

impl AdministratorPair {
    /// Exact, case-sensitive comparison. An empty email never matches.
    pub fn matches(&self, email: &str) -> bool {
        !email.is_empty() && (email == self.admin1_email || email == self.admin2_email)
    }
}

/// Background treatment of a resolved cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadStyle {
    /// No admin comparison was made.
    Plain,
    /// Author is one of the row's administrators.
    Transparent,
    /// Author is not an administrator.
    Highlighted,
}

/// Final display content decided for a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedPayload {
    /// Nothing to show; rendered as an empty cell.
    Empty,
    /// Text lines plus the admin decision when one was made.
    Content {
        /// Display lines, top to bottom.
        lines: Vec<String>,
        /// Whether the author is a row administrator, if that was checked.
        admin_match: Option<bool>,
    },
}

impl ResolvedPayload {
    /// Payload made of a single text line with no admin decision.
    pub fn text(line: impl Into<String>) -> Self {
        Self::Content {
            lines: vec![line.into()],
            admin_match: None,
        }
    }

    /// `true` for [`ResolvedPayload::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// `None` when the payload is empty or no admin comparison was active.
    pub fn admin_match(&self) -> Option<bool> {
        match self {
            Self::Empty => None,
            Self::Content {
                admin_match, ..
            } => *admin_match,
        }
    }

    /// Background treatment derived from the admin decision.
    pub fn style(&self) -> PayloadStyle {
        match self.admin_match() {
            None => PayloadStyle::Plain,
            Some(true) => PayloadStyle::Transparent,
            Some(false) => PayloadStyle::Highlighted,
        }
    }

    /// Lines joined with `\n`, without markup.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Content {
                lines, ..
            } => lines.join("\n"),
        }
    }
}

/// Visible state of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CellState {
    /// Resolution is running.
    Loading,
    /// No row identifier could be found.
    NoId,
    /// Rendering failed before resolution could start.
    Error,
    /// Resolution finished with this payload.
    Resolved {
        /// Content shown in the cell.
        payload: ResolvedPayload,
    },
}

impl CellState {
    /// Markup written into the host cell for this state.
    pub fn to_html(&self) -> String {
        match self {
            Self::Loading => markup::loading(),
            Self::NoId => markup::no_id(),
            Self::Error => markup::error(),
            Self::Resolved {
                payload,
            } => markup::payload(payload),
        }
    }
}
