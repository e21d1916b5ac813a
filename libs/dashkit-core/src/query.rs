use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::form_urlencoded;

use crate::{Error, DEFAULT_PAGE_SIZE, SEARCH_PARAM};

// ----- Sorting ---------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDir {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDir::Asc),
            "desc" => Ok(SortDir::Desc),
            other => Err(Error::InvalidSortOrder(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub dir: SortDir,
}

impl Sort {
    pub fn new(field: impl Into<String>, dir: SortDir) -> Self {
        Self {
            field: field.into(),
            dir,
        }
    }
}

// ----- Filters ---------------------------------------------------------------

/// A single column filter value as the dashboard forms produce it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Number(serde_json::Number),
    Text(String),
}

impl FilterValue {
    /// Blank values never reach the wire.
    pub fn is_blank(&self) -> bool {
        match self {
            FilterValue::Null => true,
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::Number(_) => false,
        }
    }

    pub fn to_param(&self) -> Option<String> {
        match self {
            FilterValue::Null => None,
            FilterValue::Text(s) if s.is_empty() => None,
            FilterValue::Text(s) => Some(s.clone()),
            FilterValue::Number(n) => Some(n.to_string()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Number(n.into())
    }
}

impl From<u64> for FilterValue {
    fn from(n: u64) -> Self {
        FilterValue::Number(n.into())
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(FilterValue::Number)
            .unwrap_or(FilterValue::Null)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FilterValue::Null)
    }
}

/// Column filters keyed by backend parameter name. Sorted by key so the
/// encoded query string is stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(BTreeMap<String, FilterValue>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries that will be serialized, in key order.
    pub fn active(&self) -> impl Iterator<Item = (&str, String)> {
        self.0
            .iter()
            .filter_map(|(k, v)| v.to_param().map(|p| (k.as_str(), p)))
    }

    /// Parse a `key=value` pair as typed on a command line. Numeric values
    /// stay numbers, an empty right-hand side becomes a blank text filter.
    pub fn parse_pair(raw: &str) -> Result<(String, FilterValue), Error> {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| Error::InvalidFilter(raw.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::InvalidFilter(raw.to_string()));
        }
        let value = match value.parse::<i64>() {
            Ok(n) => FilterValue::from(n),
            Err(_) => FilterValue::from(value),
        };
        Ok((key.to_string(), value))
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ----- Query state -----------------------------------------------------------

/// Everything the UI controls about a list request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    pub page: u32,
    pub page_size: u32,
    pub search: String,
    /// Fields that each receive the search term as their own parameter.
    #[serde(default)]
    pub search_fields: Vec<String>,
    #[serde(default)]
    pub filters: Filters,
    #[serde(default)]
    pub sort: Option<Sort>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: String::new(),
            search_fields: Vec::new(),
            filters: Filters::default(),
            sort: None,
        }
    }
}

impl QueryState {
    pub fn new(page: u32, page_size: u32) -> Result<Self, Error> {
        let q = Self {
            page,
            page_size,
            ..Self::default()
        };
        q.validate()?;
        Ok(q)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.page < 1 {
            return Err(Error::InvalidPage(self.page));
        }
        if self.page_size == 0 {
            return Err(Error::InvalidPageSize);
        }
        Ok(())
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, sort: Option<Sort>) -> Self {
        self.sort = sort;
        self
    }

    /// Canonical encoding: `page`, `pageSize`, active filters in key order,
    /// one parameter per search field, then `sortBy`/`sortOrder`.
    pub fn to_query_string(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        ser.append_pair("page", &self.page.to_string());
        ser.append_pair("pageSize", &self.page_size.to_string());

        for (key, value) in self.filters.active() {
            ser.append_pair(key, &value);
        }

        let term = self.search.trim();
        if !term.is_empty() {
            if self.search_fields.is_empty() {
                ser.append_pair(SEARCH_PARAM, term);
            } else {
                for field in &self.search_fields {
                    ser.append_pair(field, term);
                }
            }
        }

        if let Some(sort) = &self.sort {
            ser.append_pair("sortBy", &sort.field);
            ser.append_pair("sortOrder", sort.dir.as_str());
        }

        ser.finish()
    }
}

/// Append the encoded query to a resource path, respecting a query the
/// path may already carry.
pub fn request_url(path: &str, query: &QueryState) -> String {
    let qs = query.to_query_string();
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}{qs}")
}
