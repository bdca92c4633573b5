//! Store-agnostic description of a table read or filtered write.

use serde_json::Value;

/// Sort direction and column applied to a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

/// Builder for a filtered table query (`select … where col = v … order by … limit …`).
///
/// Filters are equality-only and combined with `AND`. Values are carried as strings because
/// both backends compare them textually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: &'static str,
    columns: Option<&'static str>,
    filters: Vec<(&'static str, String)>,
    order: Option<Order>,
    limit: Option<usize>,
}

impl Query {
    /// Start a query against `table` selecting every column.
    pub fn table(table: &'static str) -> Self {
        Self {
            table,
            columns: None,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Restrict the returned columns (comma separated).
    pub fn columns(mut self, columns: &'static str) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Add an equality filter.
    pub fn eq(mut self, column: &'static str, value: impl ToString) -> Self {
        self.filters.push((column, value.to_string()));
        self
    }

    /// Order the rows by `column`.
    pub fn order_by(mut self, column: &'static str, descending: bool) -> Self {
        self.order = Some(Order { column, descending });
        self
    }

    /// Cap the number of returned rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table_name(&self) -> &'static str {
        self.table
    }

    pub fn selected_columns(&self) -> &'static str {
        self.columns.unwrap_or("*")
    }

    pub fn filters(&self) -> &[(&'static str, String)] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether `row` satisfies every equality filter of this query.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|(column, expected)| {
            row.get(*column)
                .is_some_and(|actual| value_as_text(actual) == *expected)
        })
    }
}

/// Textual form of a JSON scalar, as it would appear in a URL filter.
pub fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn matches_requires_every_filter() {
        let query = Query::table("matches").eq("user_id", "u1").eq("result", "win");

        assert!(query.matches(&json!({"user_id": "u1", "result": "win"})));
        assert!(!query.matches(&json!({"user_id": "u1", "result": "loss"})));
        assert!(!query.matches(&json!({"result": "win"})));
    }

    #[test]
    fn matches_compares_numbers_textually() {
        let query = Query::table("clans").eq("points", 10);
        assert!(query.matches(&json!({"points": 10})));
        assert!(!query.matches(&json!({"points": "11"})));
    }

    #[test]
    fn defaults_select_every_column() {
        let query = Query::table("profiles");
        assert_eq!(query.selected_columns(), "*");
        assert_eq!(query.row_limit(), None);
        assert!(query.ordering().is_none());
    }
}
