//! Declarative read description: table, projection, filters, ordering.
//!
//! A [`Query`] is transport-agnostic. [`super::PostgrestBackend`] renders it
//! into REST query parameters, [`super::MemoryBackend`] evaluates it against
//! in-memory rows.

/// Sort direction for [`Order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first, nulls last.
    Ascending,
    /// Largest first, nulls first.
    Descending,
}

/// Single-column ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Column to sort by.
    pub column: String,
    /// Sort direction.
    pub direction: Direction,
}

/// Equality filter `column = value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Filtered column.
    pub column: String,
    /// Expected value, compared in its textual form.
    pub value: String,
}

impl Filter {
    /// Creates an equality filter.
    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Parent row embedded into each result row through a foreign key.
///
/// The child row holds `key`; the parent table has the same column as its
/// primary key. The embedded object is stored under the parent table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    /// Parent table name (also the key of the embedded object).
    pub table: String,
    /// Shared key column.
    pub key: String,
    /// Parent columns to project.
    pub columns: Vec<String>,
}

/// A read against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Table name.
    pub table: String,
    /// Projected columns; empty means all.
    pub columns: Vec<String>,
    /// Optional embedded parent.
    pub embed: Option<Embed>,
    /// Equality filters, all of which must match.
    pub filters: Vec<Filter>,
    /// Optional ordering.
    pub order: Option<Order>,
    /// Optional row cap applied after ordering.
    pub limit: Option<u32>,
    /// Whether the exact total count is requested.
    pub count: bool,
    /// Whether rows are omitted (count only).
    pub head: bool,
}

impl Query {
    /// Starts a `select *` on `table`.
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            embed: None,
            filters: Vec::new(),
            order: None,
            limit: None,
            count: false,
            head: false,
        }
    }

    /// Restricts the projection to `columns`.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Embeds the parent row of `table` joined on `key`.
    #[must_use]
    pub fn embed(mut self, table: &str, key: &str, columns: &[&str]) -> Self {
        self.embed = Some(Embed {
            table: table.to_string(),
            key: key.to_string(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        });
        self
    }

    /// Adds an equality filter.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    /// Orders by `column`, largest first.
    #[must_use]
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            direction: Direction::Descending,
        });
        self
    }

    /// Orders by `column`, smallest first.
    #[must_use]
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            direction: Direction::Ascending,
        });
        self
    }

    /// Caps the number of returned rows.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Requests the exact number of matching rows.
    #[must_use]
    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Requests only the count, without rows.
    #[must_use]
    pub fn head(mut self) -> Self {
        self.count = true;
        self.head = true;
        self
    }

    /// Renders the `select` parameter, e.g. `*,projects(project_name)`.
    #[must_use]
    pub fn select_clause(&self) -> String {
        let mut clause = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        if let Some(embed) = &self.embed {
            let inner = if embed.columns.is_empty() {
                "*".to_string()
            } else {
                embed.columns.join(",")
            };
            clause.push_str(&format!(",{}({inner})", embed.table));
        }
        clause
    }

    /// Renders filters, ordering and limit as REST query parameters.
    #[must_use]
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select_clause())];
        params.extend(filter_params(&self.filters));
        if let Some(order) = &self.order {
            let dir = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            params.push(("order".to_string(), format!("{}.{dir}", order.column)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// Renders equality filters as `column=eq.value` pairs.
#[must_use]
pub fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), format!("eq.{}", f.value)))
        .collect()
}
