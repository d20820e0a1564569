//! Rendering [`Predicate`]s as SQL with bound parameters.
//!
//! User input only ever reaches SQLite as a bound value. The SQL text is
//! assembled from fixed column names and operators.

use covid_core::filter::{Column, Predicate};
use rusqlite::types::Value as SqlValue;

use crate::encode::encode_value;

/// A SQL fragment and the values for its `?` placeholders, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
  pub sql:    String,
  pub params: Vec<SqlValue>,
}

/// Qualified column names for one query shape.
#[derive(Debug, Clone, Copy)]
pub struct Columns {
  /// Alias of the `addresses` table.
  pub address: &'static str,
  /// Alias of the table holding the date column.
  pub dated:   &'static str,
}

impl Columns {
  fn qualified(self, column: Column) -> String {
    let table = match column {
      Column::Date => self.dated,
      Column::Id | Column::Admin2 | Column::Address1 | Column::Address2 => self.address,
    };
    format!("{table}.{}", column.name())
  }
}

/// Render `predicate` as a boolean expression, `1` when it matches all.
///
/// OR-groups are parenthesised and joined with `AND`.
pub fn render(predicate: &Predicate, columns: Columns) -> SqlFragment {
  if predicate.is_match_all() {
    return SqlFragment { sql: "1".to_owned(), params: vec![] };
  }

  let mut params = Vec::new();
  let groups: Vec<String> = predicate
    .groups()
    .iter()
    .map(|group| {
      let clauses: Vec<String> = group
        .iter()
        .map(|clause| {
          params.push(encode_value(&clause.value));
          format!("{} {} ?", columns.qualified(clause.column), clause.op.symbol())
        })
        .collect();
      format!("({})", clauses.join(" OR "))
    })
    .collect();

  SqlFragment { sql: groups.join(" AND "), params }
}
