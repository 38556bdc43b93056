//! Table metadata types.
//!
//! Describes the tables of the embedded database: columns, keys, indexes,
//! row counts and the optional description supplied by configuration.

use serde::{Deserialize, Serialize};

/// Metadata for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name.
    pub name: String,

    /// Columns in declaration order.
    pub columns: Vec<TableColumn>,

    /// Primary key column names (empty if none).
    pub primary_key: Vec<String>,

    /// Secondary indexes.
    pub indexes: Vec<TableIndex>,

    /// Number of rows at introspection time.
    pub row_count: i64,

    /// Human description from the `[tables.<name>]` config section.
    pub description: Option<String>,
}

/// A column within a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub default: Option<String>,
}

/// An index on a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableIndex {
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
}

impl TableInfo {
    /// Attaches a description, keeping the existing one when `None`.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        if description.is_some() {
            self.description = description;
        }
        self
    }

    /// Formats the table as an indented, human-readable block.
    pub fn format_for_display(&self) -> String {
        let mut out = format!("{}: {} records\n", self.name, self.row_count);

        if let Some(description) = &self.description {
            out.push_str(&format!("  {description}\n"));
        }

        for column in &self.columns {
            let annotations = [
                self.primary_key.contains(&column.name).then_some("PK".to_string()),
                (!column.is_nullable).then_some("NOT NULL".to_string()),
                column.default.as_ref().map(|d| format!("DEFAULT {d}")),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

            if annotations.is_empty() {
                out.push_str(&format!("  - {}: {}\n", column.name, column.data_type));
            } else {
                out.push_str(&format!(
                    "  - {}: {} ({})\n",
                    column.name,
                    column.data_type,
                    annotations.join(", ")
                ));
            }
        }

        for index in &self.indexes {
            let kind = if index.is_unique { "UNIQUE INDEX" } else { "INDEX" };
            out.push_str(&format!(
                "  {} {} ({})\n",
                kind,
                index.name,
                index.columns.join(", ")
            ));
        }

        out
    }
}
