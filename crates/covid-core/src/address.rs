//! The address dimension shared by every report row.
//!
//! An upload names a location with up to three parts. Which parts it names
//! depends on which columns its header declares, so every optional part is
//! carried as a [`Field`] rather than a bare string.

use serde::{Deserialize, Serialize};

// ─── Field ───────────────────────────────────────────────────────────────────

/// A value that an upload either declared (possibly empty) or never
/// measured at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
  Present(T),
  #[default]
  Absent,
}

impl<T> Field<T> {
  pub fn is_present(&self) -> bool { matches!(self, Self::Present(_)) }
}

impl Field<String> {
  /// The stored form of a declared value: empty cells become `None`.
  ///
  /// Returns `None` for [`Field::Absent`] too; use [`Field::is_present`] to
  /// tell the two apart.
  pub fn non_empty(&self) -> Option<&str> {
    match self {
      Self::Present(v) if !v.is_empty() => Some(v.as_str()),
      _ => None,
    }
  }
}

// ─── Candidate key ───────────────────────────────────────────────────────────

/// The location a single upload row refers to, before it is resolved to an
/// [`Address`] id.
///
/// Two keys identify the same address when they agree on every part the
/// current upload declares; parts marked [`Field::Absent`] never take part
/// in matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressKey {
  pub admin2:   Field<String>,
  pub province: Field<String>,
  pub country:  String,
}

impl AddressKey {
  pub fn new(country: impl Into<String>) -> Self {
    Self {
      admin2:   Field::Absent,
      province: Field::Absent,
      country:  country.into(),
    }
  }

  pub fn with_admin2(mut self, admin2: impl Into<String>) -> Self {
    self.admin2 = Field::Present(admin2.into());
    self
  }

  pub fn with_province(mut self, province: impl Into<String>) -> Self {
    self.province = Field::Present(province.into());
    self
  }
}

// ─── Stored address ──────────────────────────────────────────────────────────

/// A persisted address row. Created on first sighting, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub id:       i64,
  #[serde(rename = "Admin2")]
  pub admin2:   Option<String>,
  #[serde(rename = "Province/State")]
  pub province: Option<String>,
  #[serde(rename = "Country/Region")]
  pub country:  String,
}

impl Address {
  /// Human-readable label: `"<admin2>, <province>, <country>"`, leaving out
  /// empty parts along with their separator.
  pub fn label(&self) -> String {
    let mut out = String::new();
    for part in [&self.admin2, &self.province] {
      if let Some(p) = part.as_deref().filter(|p| !p.is_empty()) {
        out.push_str(p);
        out.push_str(", ");
      }
    }
    out.push_str(&self.country);
    out
  }
}
