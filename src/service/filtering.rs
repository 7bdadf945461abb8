//! Filter and sort expressions for list queries
//!
//! ```rust
//! use ambra_sdk::service::filtering::Field;
//!
//! let filter = Field::new("patient_name").like("%SMITH%");
//! assert_eq!(filter.key(), "filter.patient_name.like");
//!
//! let sorter = Field::new("created").desc();
//! assert_eq!(sorter.to_string(), "created-desc");
//! ```

use super::params::ParamValue;
use std::fmt;

/// Comparison applied by a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterCondition {
    Equals,
    EqualsOrNull,
    NotEquals,
    Like,
    NotLike,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    InOrNull,
    NotIn,
    IsNull,
    NotNull,
}

impl FilterCondition {
    /// Name used in the `filter.<field>.<condition>` key
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterCondition::Equals => "equals",
            FilterCondition::EqualsOrNull => "equals_or_null",
            FilterCondition::NotEquals => "not_equals",
            FilterCondition::Like => "like",
            FilterCondition::NotLike => "not_like",
            FilterCondition::Gt => "gt",
            FilterCondition::Ge => "ge",
            FilterCondition::Lt => "lt",
            FilterCondition::Le => "le",
            FilterCondition::In => "in",
            FilterCondition::InOrNull => "in_or_null",
            FilterCondition::NotIn => "not_in",
            FilterCondition::IsNull => "null",
            FilterCondition::NotNull => "not_null",
        }
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `filter.<field>.<condition>=<value>` parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    field: String,
    condition: FilterCondition,
    value: ParamValue,
}

impl Filter {
    /// Build a filter from parts
    pub fn new(
        field: impl Into<String>,
        condition: FilterCondition,
        value: impl Into<ParamValue>,
    ) -> Self {
        Self {
            field: field.into(),
            condition,
            value: value.into(),
        }
    }

    /// Field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Condition
    pub fn condition(&self) -> FilterCondition {
        self.condition
    }

    /// Parameter key
    pub fn key(&self) -> String {
        format!("filter.{}.{}", self.field, self.condition)
    }

    /// Parameter value
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Key/value pair for the request
    pub fn to_param(&self) -> (String, String) {
        (self.key(), self.value.as_str().to_string())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One entry of the `sort_by` parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sorter {
    field: String,
    direction: SortDirection,
}

impl Sorter {
    /// Sort by `field` in `direction`
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Render several sorters as one `sort_by` value
    pub fn join(sorters: &[Sorter]) -> String {
        sorters
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Sorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Asc => f.write_str(&self.field),
            SortDirection::Desc => write!(f, "{}-desc", self.field),
        }
    }
}

/// Builder for filters and sorters on one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field(String);

impl Field {
    /// Name a field of the listed object
    pub fn new(name: impl Into<String>) -> Self {
        Field(name.into())
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.0
    }

    fn filter(&self, condition: FilterCondition, value: impl Into<ParamValue>) -> Filter {
        Filter::new(self.0.clone(), condition, value)
    }

    pub fn equals(&self, value: impl Into<ParamValue>) -> Filter {
        self.filter(FilterCondition::Equals, value)
    }

    pub fn equals_or_null(&self, value: impl Into<ParamValue>) -> Filter {
        self.filter(FilterCondition::EqualsOrNull, value)
    }

    pub fn not_equals(&self, value: impl Into<ParamValue>) -> Filter {
        self.filter(FilterCondition::NotEquals, value)
    }

    /// SQL-style pattern, `%` is the wildcard
    pub fn like(&self, pattern: impl Into<ParamValue>) -> Filter {
        self.filter(FilterCondition::Like, pattern)
    }

    pub fn not_like(&self, pattern: impl Into<ParamValue>) -> Filter {
        self.filter(FilterCondition::NotLike, pattern)
    }

    pub fn gt(&self, value: impl Into<ParamValue>) -> Filter {
        self.filter(FilterCondition::Gt, value)
    }

    pub fn ge(&self, value: impl Into<ParamValue>) -> Filter {
        self.filter(FilterCondition::Ge, value)
    }

    pub fn lt(&self, value: impl Into<ParamValue>) -> Filter {
        self.filter(FilterCondition::Lt, value)
    }

    pub fn le(&self, value: impl Into<ParamValue>) -> Filter {
        self.filter(FilterCondition::Le, value)
    }

    /// Matches any of `values`, sent as a JSON array
    pub fn in_<I, T>(&self, values: I) -> Filter
    where
        I: IntoIterator<Item = T>,
        T: Into<ParamValue>,
    {
        self.filter(FilterCondition::In, ParamValue::list(values))
    }

    pub fn in_or_null<I, T>(&self, values: I) -> Filter
    where
        I: IntoIterator<Item = T>,
        T: Into<ParamValue>,
    {
        self.filter(FilterCondition::InOrNull, ParamValue::list(values))
    }

    pub fn not_in<I, T>(&self, values: I) -> Filter
    where
        I: IntoIterator<Item = T>,
        T: Into<ParamValue>,
    {
        self.filter(FilterCondition::NotIn, ParamValue::list(values))
    }

    pub fn is_null(&self) -> Filter {
        self.filter(FilterCondition::IsNull, true)
    }

    pub fn not_null(&self) -> Filter {
        self.filter(FilterCondition::NotNull, true)
    }

    pub fn asc(&self) -> Sorter {
        Sorter::new(self.0.clone(), SortDirection::Asc)
    }

    pub fn desc(&self) -> Sorter {
        Sorter::new(self.0.clone(), SortDirection::Desc)
    }
}
