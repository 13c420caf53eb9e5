//! Model adapter seam.
//!
//! The resolver ends at a [`ResourceHandle`]; an adapter turns it into
//! whatever the caller displays. Ownership of the handle moves to the adapter.

use std::fmt;
use std::future::Future;
use thiserror::Error;

use crate::net::ResourceHandle;

/// The adapter could not build a model.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct AdapterFault(pub String);

/// Builds a display model from a resolved table.
pub trait ModelAdapter: Send + Sync {
    type Model: Send;

    fn make_model(
        &self,
        handle: ResourceHandle,
    ) -> impl Future<Output = Result<Self::Model, AdapterFault>> + Send;
}

/// Flat description of a resolved table, printed by the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub id: String,
    pub name: String,
    pub columns: Vec<String>,
    pub size: Option<u64>,
    pub refreshing: bool,
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)?;
        if !self.columns.is_empty() {
            write!(f, " columns=[{}]", self.columns.join(", "))?;
        }
        if let Some(size) = self.size {
            write!(f, " rows={}", size)?;
        }
        f.write_str(if self.refreshing { " refreshing" } else { " static" })
    }
}

/// Adapter producing a [`TableSummary`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryAdapter;

impl ModelAdapter for SummaryAdapter {
    type Model = TableSummary;

    async fn make_model(&self, handle: ResourceHandle) -> Result<TableSummary, AdapterFault> {
        if handle.id.is_empty() {
            return Err(AdapterFault(format!("Table '{}' has no server id", handle.name)));
        }
        Ok(TableSummary {
            columns: handle
                .columns
                .iter()
                .map(|c| format!("{}:{}", c.name, c.data_type))
                .collect(),
            id: handle.id,
            name: handle.name,
            size: handle.size,
            refreshing: handle.refreshing,
        })
    }
}
