use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Id,
    Name,
    Price,
    InStock,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::Price => "price",
            SortField::InStock => "in_stock",
        }
    }

    /// Unrecognised field names sort by id.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "name" => SortField::Name,
            "price" => SortField::Price,
            "in_stock" | "instock" | "stock" => SortField::InStock,
            "id" => SortField::Id,
            other => {
                tracing::debug!(field = %other, "unknown sort field, ordering by id");
                SortField::Id
            }
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-text query plus ordering applied to the cached product list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSortState {
    pub query: String,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
}
