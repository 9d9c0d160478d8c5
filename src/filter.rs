//! Shared filter predicate builder for the query engine.
//!
//! All five read operations render their WHERE clause through
//! [`ProductFilter`], so the month semantics can never drift between
//! endpoints. The search term's mode (numeric vs. text) is decided exactly
//! once, here, and selects both the matching predicate and the sort order.

use crate::error::{EngineError, EngineResult};

/// The three search behaviors, decided once per request.
///
/// A term is numeric iff the trimmed string parses as a finite `f64`.
/// Alphanumeric terms like `"4tb"` fail that parse and stay text — this
/// mirrors the upstream catalog UI, where searching `4tb` is a title match,
/// not a price cap.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchMode {
    /// Empty term: every row matches, insertion (id) order.
    None,
    /// Non-numeric term: substring match on title/description, with the
    /// price arm of the predicate kept always-true as a deliberate
    /// fallback. Ordered by id.
    Text(String),
    /// Numeric term: same substring arms, plus `price <= value`. Ordered
    /// by price descending, id as tie-break.
    Numeric { raw: String, value: f64 },
}

impl SearchMode {
    pub fn from_term(term: &str) -> Self {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Self::None;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Numeric {
                raw: trimmed.to_string(),
                value,
            },
            _ => Self::Text(trimmed.to_string()),
        }
    }
}

/// Row ordering, derived from the search mode and nothing else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProductOrder {
    IdAsc,
    PriceDescIdAsc,
}

impl ProductOrder {
    pub fn sql(self) -> &'static str {
        match self {
            Self::IdAsc => "id ASC",
            Self::PriceDescIdAsc => "price DESC, id ASC",
        }
    }
}

/// A positional bind value for the rendered WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Int(i64),
    Real(f64),
    Text(String),
}

/// Month + search predicate shared by every read operation.
///
/// Constructed through [`ProductFilter::month_only`] or
/// [`ProductFilter::with_search`], which validate the month range up front.
#[derive(Debug, Clone)]
pub struct ProductFilter {
    month: Option<u32>,
    search: SearchMode,
}

impl ProductFilter {
    /// Filter by month alone (the aggregate operations).
    pub fn month_only(month: Option<u32>) -> EngineResult<Self> {
        Self::build(month, SearchMode::None)
    }

    /// Filter by month plus a search term (the search operation).
    pub fn with_search(month: Option<u32>, term: &str) -> EngineResult<Self> {
        Self::build(month, SearchMode::from_term(term))
    }

    fn build(month: Option<u32>, search: SearchMode) -> EngineResult<Self> {
        if let Some(m) = month {
            if !(1..=12).contains(&m) {
                return Err(EngineError::InvalidArgument(format!(
                    "month must be between 1 and 12, got {m}"
                )));
            }
        }
        Ok(Self { month, search })
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn search(&self) -> &SearchMode {
        &self.search
    }

    /// The ordering implied by the search mode. Numeric search sorts by
    /// price; everything else keeps insertion order.
    pub fn order(&self) -> ProductOrder {
        match self.search {
            SearchMode::Numeric { .. } => ProductOrder::PriceDescIdAsc,
            _ => ProductOrder::IdAsc,
        }
    }

    /// Render the WHERE clause body. `1 = 1` when nothing is filtered, so
    /// callers can interpolate unconditionally.
    ///
    /// The month component compares against the month extracted from
    /// `date_of_sale` by SQLite itself; malformed dates fall out of every
    /// month-filtered result identically across endpoints.
    pub fn where_sql(&self) -> String {
        let mut clauses: Vec<&str> = Vec::new();
        if self.month.is_some() {
            clauses.push("CAST(strftime('%m', date_of_sale) AS INTEGER) = ?");
        }
        if !matches!(self.search, SearchMode::None) {
            clauses.push(
                "(LOWER(title) LIKE LOWER(?) OR LOWER(description) LIKE LOWER(?) OR price <= ?)",
            );
        }
        if clauses.is_empty() {
            "1 = 1".to_string()
        } else {
            clauses.join(" AND ")
        }
    }

    /// Bind values in the positional order of [`Self::where_sql`].
    pub fn bind_values(&self) -> Vec<BindValue> {
        let mut values = Vec::new();
        if let Some(m) = self.month {
            values.push(BindValue::Int(i64::from(m)));
        }
        match &self.search {
            SearchMode::None => {}
            SearchMode::Text(term) => {
                let pattern = format!("%{term}%");
                values.push(BindValue::Text(pattern.clone()));
                values.push(BindValue::Text(pattern));
                // Always-true price arm: text searches fall back to
                // matching every row by price.
                values.push(BindValue::Real(f64::MAX));
            }
            SearchMode::Numeric { raw, value } => {
                let pattern = format!("%{raw}%");
                values.push(BindValue::Text(pattern.clone()));
                values.push(BindValue::Text(pattern));
                values.push(BindValue::Real(*value));
            }
        }
        values
    }
}
