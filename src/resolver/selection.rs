//! Strategy selection from request parameters.

use std::fmt;

/// Query parameter naming the group to search.
pub const QUERY_NAME_PARAM: &str = "queryName";
/// Query parameter naming the table inside the group.
pub const TABLE_NAME_PARAM: &str = "tableName";

/// Which resolution strategy to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Find `table` inside the server-announced group `group`.
    Locate { group: String, table: String },
    /// Compute a throwaway table on a scratch session.
    CreateEphemeral,
}

impl Selection {
    /// Locate when both names are present and non-empty, otherwise create.
    pub fn new(query_name: Option<&str>, table_name: Option<&str>) -> Self {
        let present = |value: Option<&str>| value.filter(|v| !v.is_empty()).map(str::to_string);
        match (present(query_name), present(table_name)) {
            (Some(group), Some(table)) => Selection::Locate { group, table },
            _ => Selection::CreateEphemeral,
        }
    }

    /// Parse a URL query string (leading `?` optional, percent-encoded).
    /// Later duplicates of a key win.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut query_name = None;
        let mut table_name = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                QUERY_NAME_PARAM => query_name = Some(value.into_owned()),
                TABLE_NAME_PARAM => table_name = Some(value.into_owned()),
                _ => {}
            }
        }
        Self::new(query_name.as_deref(), table_name.as_deref())
    }

    /// Label used in logs and metrics.
    pub fn strategy(&self) -> &'static str {
        match self {
            Selection::Locate { .. } => "locate",
            Selection::CreateEphemeral => "ephemeral",
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Locate { group, table } => write!(f, "{}/{}", group, table),
            Selection::CreateEphemeral => f.write_str("<ephemeral>"),
        }
    }
}
