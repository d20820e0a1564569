//! Read-side filtering: query-parameter validation and predicate compilation.
//!
//! A request's query string is compiled into a [`ReportFilter`]: a
//! [`Predicate`] over the address dimension, a separate [`Predicate`] over
//! the date axis, and the [`MetricKind`] the caller wants displayed.
//!
//! Predicates are data, not SQL. Storage backends render them with bound
//! parameters; the [`fmt::Display`] form below is for logs and tests only.

use std::{collections::BTreeMap, fmt};

use chrono::NaiveDate;

use crate::{Error, Result, date::parse_date, report::MetricKind};

// ─── Parameter keywords ──────────────────────────────────────────────────────

/// A recognised query-parameter keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKey {
  Id,
  Admin2,
  /// `province` or `state`.
  Address1,
  /// `country` or `region`.
  Address2,
  Date,
  From,
  To,
  Death,
  Recovered,
}

impl FilterKey {
  /// Map a lower-cased keyword to its canonical key. `None` means the whole
  /// request must be rejected.
  pub fn validate(keyword: &str) -> Option<Self> {
    Some(match keyword {
      "id" => Self::Id,
      "admin2" => Self::Admin2,
      "province" | "state" => Self::Address1,
      "country" | "region" => Self::Address2,
      "date" => Self::Date,
      "from" => Self::From,
      "to" => Self::To,
      "death" => Self::Death,
      "recovered" => Self::Recovered,
      _ => return None,
    })
  }

  #[cfg(test)]
  fn canonical(self) -> &'static str {
    match self {
      Self::Id => "id",
      Self::Admin2 => "admin2",
      Self::Address1 => "address1",
      Self::Address2 => "address2",
      Self::Date => "date",
      Self::From => "from",
      Self::To => "to",
      Self::Death => "death",
      Self::Recovered => "recovered",
    }
  }
}

// ─── Predicate building blocks ───────────────────────────────────────────────

/// A filterable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
  Id,
  Admin2,
  Address1,
  Address2,
  Date,
}

impl Column {
  pub fn name(self) -> &'static str {
    match self {
      Self::Id => "id",
      Self::Admin2 => "admin2",
      Self::Address1 => "address1",
      Self::Address2 => "address2",
      Self::Date => "date",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
  Eq,
  Ge,
  Le,
}

impl Op {
  pub fn symbol(self) -> &'static str {
    match self {
      Self::Eq => "=",
      Self::Ge => ">=",
      Self::Le => "<=",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  Int(i64),
  Text(String),
  Date(NaiveDate),
}

/// A single `column op value` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
  pub column: Column,
  pub op:     Op,
  pub value:  Value,
}

/// A conjunction of OR-groups. An empty predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
  groups: Vec<Vec<Clause>>,
}

impl Predicate {
  pub fn match_all() -> Self { Self::default() }

  pub fn is_match_all(&self) -> bool { self.groups.is_empty() }

  pub fn groups(&self) -> &[Vec<Clause>] { &self.groups }

  /// AND a new OR-group onto the predicate. Empty groups are ignored.
  pub fn push_group(&mut self, group: Vec<Clause>) {
    if !group.is_empty() {
      self.groups.push(group);
    }
  }

  /// Both predicates must hold.
  pub fn and(&self, other: &Predicate) -> Predicate {
    let mut groups = self.groups.clone();
    groups.extend(other.groups.iter().cloned());
    Predicate { groups }
  }
}

impl fmt::Display for Clause {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", self.column.name(), self.op.symbol())?;
    match &self.value {
      Value::Int(i) => write!(f, "{i}"),
      Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
      Value::Date(d) => write!(f, "'{}'", d.format("%Y/%-m/%-d")),
    }
  }
}

impl fmt::Display for Predicate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.groups.is_empty() {
      return f.write_str("TRUE");
    }
    for (i, group) in self.groups.iter().enumerate() {
      if i > 0 {
        f.write_str(" AND ")?;
      }
      let wrap = group.len() > 1 && self.groups.len() > 1;
      if wrap {
        f.write_str("(")?;
      }
      for (j, clause) in group.iter().enumerate() {
        if j > 0 {
          f.write_str(" OR ")?;
        }
        write!(f, "{clause}")?;
      }
      if wrap {
        f.write_str(")")?;
      }
    }
    Ok(())
  }
}

// ─── Compiled filter ─────────────────────────────────────────────────────────

/// The compiled form of a read request's query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
  /// Clauses over `id`, `admin2`, `address1`, `address2`.
  pub address: Predicate,
  /// Clauses over the date axis.
  pub dates:   Predicate,
  /// Which metric the caller asked to see; `Confirmed` unless a display
  /// flag was given.
  pub display: MetricKind,
}

impl ReportFilter {
  /// Address and date clauses together, for single-table reads.
  pub fn combined(&self) -> Predicate { self.address.and(&self.dates) }
}

/// Compile raw `(name, value)` query pairs into a [`ReportFilter`].
///
/// Names are case-insensitive; a repeated name extends the same OR-group.
/// Values are comma-separated lists. Every name is validated before any
/// value is looked at, so an unknown parameter is always reported even when
/// other parameters are also malformed.
pub fn compile<I, K, V>(params: I) -> Result<ReportFilter>
where
  I: IntoIterator<Item = (K, V)>,
  K: AsRef<str>,
  V: AsRef<str>,
{
  let mut raw: BTreeMap<String, Vec<String>> = BTreeMap::new();
  for (name, value) in params {
    raw
      .entry(name.as_ref().to_ascii_lowercase())
      .or_default()
      .push(value.as_ref().to_owned());
  }

  let mut keyed = Vec::with_capacity(raw.len());
  for (name, values) in raw {
    let key = FilterKey::validate(&name).ok_or_else(|| Error::UnknownParameter(name.clone()))?;
    keyed.push((name, key, values));
  }

  let death = keyed.iter().any(|(_, k, _)| *k == FilterKey::Death);
  let recovered = keyed.iter().any(|(_, k, _)| *k == FilterKey::Recovered);
  let display = match (death, recovered) {
    (true, true) => return Err(Error::ConflictingDisplayModes),
    (true, false) => MetricKind::Death,
    (false, true) => MetricKind::Recovered,
    (false, false) => MetricKind::Confirmed,
  };

  let mut filter = ReportFilter { display, ..ReportFilter::default() };

  for (name, key, values) in keyed {
    let (column, op) = match key {
      FilterKey::Death | FilterKey::Recovered => continue,
      FilterKey::Id => (Column::Id, Op::Eq),
      FilterKey::Admin2 => (Column::Admin2, Op::Eq),
      FilterKey::Address1 => (Column::Address1, Op::Eq),
      FilterKey::Address2 => (Column::Address2, Op::Eq),
      FilterKey::Date => (Column::Date, Op::Eq),
      FilterKey::From => (Column::Date, Op::Ge),
      FilterKey::To => (Column::Date, Op::Le),
    };

    let tokens: Vec<&str> = values
      .iter()
      .flat_map(|v| v.split(','))
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .collect();
    if tokens.is_empty() {
      return Err(Error::EmptyFilterValue(name));
    }

    let group = tokens
      .into_iter()
      .map(|token| -> Result<Clause> {
        let value = match column {
          Column::Id => Value::Int(token.parse().map_err(|_| Error::InvalidId(token.to_owned()))?),
          Column::Date => Value::Date(parse_date(token)?),
          Column::Admin2 | Column::Address1 | Column::Address2 => Value::Text(token.to_owned()),
        };
        Ok(Clause { column, op, value })
      })
      .collect::<Result<Vec<_>>>()?;

    if column == Column::Date {
      filter.dates.push_group(group);
    } else {
      filter.address.push_group(group);
    }
  }

  Ok(filter)
}
