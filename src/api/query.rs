use crate::error::FirestoreResult;
use crate::model::{FieldPath, IntoFieldPath};
use crate::value::NativeValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayContains,
    ArrayContainsAny,
    In,
    NotIn,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "EQUAL",
            FilterOperator::NotEqual => "NOT_EQUAL",
            FilterOperator::LessThan => "LESS_THAN",
            FilterOperator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            FilterOperator::GreaterThan => "GREATER_THAN",
            FilterOperator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            FilterOperator::ArrayContains => "ARRAY_CONTAINS",
            FilterOperator::ArrayContainsAny => "ARRAY_CONTAINS_ANY",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT_IN",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Ascending => "ASCENDING",
            OrderDirection::Descending => "DESCENDING",
        }
    }
}

/// A single `field <op> value` condition. Filters in one query are AND-ed.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
    field: FieldPath,
    operator: FilterOperator,
    value: NativeValue,
}

impl FieldFilter {
    pub fn new(
        field: impl IntoFieldPath,
        operator: FilterOperator,
        value: impl Into<NativeValue>,
    ) -> FirestoreResult<Self> {
        Ok(Self {
            field: field.into_field_path()?,
            operator,
            value: value.into(),
        })
    }

    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> &NativeValue {
        &self.value
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    field: FieldPath,
    direction: OrderDirection,
}

impl OrderBy {
    pub fn new(field: impl IntoFieldPath, direction: OrderDirection) -> FirestoreResult<Self> {
        Ok(Self {
            field: field.into_field_path()?,
            direction,
        })
    }

    pub fn ascending(field: impl IntoFieldPath) -> FirestoreResult<Self> {
        Self::new(field, OrderDirection::Ascending)
    }

    pub fn descending(field: impl IntoFieldPath) -> FirestoreResult<Self> {
        Self::new(field, OrderDirection::Descending)
    }

    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn direction(&self) -> OrderDirection {
        self.direction
    }
}

/// Cursor position expressed as values of the `order_by` fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Bound {
    values: Vec<NativeValue>,
    inclusive: bool,
}

impl Bound {
    pub fn new(values: Vec<NativeValue>, inclusive: bool) -> Self {
        Self { values, inclusive }
    }

    pub fn values(&self) -> &[NativeValue] {
        &self.values
    }

    pub fn inclusive(&self) -> bool {
        self.inclusive
    }
}

/// Options accepted by `FirestoreClient::list`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListOptions {
    pub order_by: Vec<OrderBy>,
    pub limit: Option<i64>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One page request for `FirestoreClient::list_page`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageRequest {
    pub page_size: Option<i32>,
    pub page_token: Option<String>,
    pub order_by: Vec<OrderBy>,
}

impl PageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_size(mut self, page_size: i32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Continues from the `next_page_token` of a previous page.
    pub fn page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }
}

/// Options accepted by `FirestoreClient::query`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryOptions {
    pub filters: Vec<FieldFilter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub start_at: Option<Bound>,
    pub end_at: Option<Bound>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Shorthand for `filter(FieldFilter::new(..)?)`.
    pub fn where_field(
        self,
        field: impl IntoFieldPath,
        operator: FilterOperator,
        value: impl Into<NativeValue>,
    ) -> FirestoreResult<Self> {
        Ok(self.filter(FieldFilter::new(field, operator, value)?))
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn start_at(mut self, values: Vec<NativeValue>) -> Self {
        self.start_at = Some(Bound::new(values, true));
        self
    }

    pub fn start_after(mut self, values: Vec<NativeValue>) -> Self {
        self.start_at = Some(Bound::new(values, false));
        self
    }

    pub fn end_at(mut self, values: Vec<NativeValue>) -> Self {
        self.end_at = Some(Bound::new(values, true));
        self
    }

    pub fn end_before(mut self, values: Vec<NativeValue>) -> Self {
        self.end_at = Some(Bound::new(values, false));
        self
    }
}

impl From<ListOptions> for QueryOptions {
    fn from(options: ListOptions) -> Self {
        Self {
            order_by: options.order_by,
            limit: options.limit,
            ..Self::default()
        }
    }
}

/// A query over one collection, ready to be compiled into a `StructuredQuery`.
#[derive(Clone, Debug, PartialEq)]
pub struct QuerySpec {
    collection: String,
    options: QueryOptions,
}

impl QuerySpec {
    pub fn new(collection: impl Into<String>, options: impl Into<QueryOptions>) -> Self {
        Self {
            collection: collection.into(),
            options: options.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.options.filters
    }

    pub fn order_by(&self) -> &[OrderBy] {
        &self.options.order_by
    }

    pub fn limit(&self) -> Option<i64> {
        self.options.limit
    }

    pub fn offset(&self) -> Option<i64> {
        self.options.offset
    }

    pub fn start_at(&self) -> Option<&Bound> {
        self.options.start_at.as_ref()
    }

    pub fn end_at(&self) -> Option<&Bound> {
        self.options.end_at.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_options_in_call_order() {
        let options = QueryOptions::new()
            .where_field("category", FilterOperator::Equal, "news")
            .unwrap()
            .where_field("likes", FilterOperator::GreaterThan, 10)
            .unwrap()
            .order_by(OrderBy::descending("likes").unwrap())
            .limit(5);
        let spec = QuerySpec::new("posts", options);
        assert_eq!(spec.collection(), "posts");
        assert_eq!(spec.filters().len(), 2);
        assert_eq!(spec.filters()[0].field().canonical_string(), "category");
        assert_eq!(spec.filters()[1].operator().as_str(), "GREATER_THAN");
        assert_eq!(spec.order_by()[0].direction(), OrderDirection::Descending);
        assert_eq!(spec.limit(), Some(5));
    }

    #[test]
    fn list_options_convert_without_filters() {
        let spec = QuerySpec::new("posts", ListOptions::new().limit(3));
        assert!(spec.filters().is_empty());
        assert_eq!(spec.limit(), Some(3));
        assert!(spec.start_at().is_none());
    }

    #[test]
    fn invalid_field_paths_are_rejected() {
        let err = FieldFilter::new("", FilterOperator::Equal, 1).unwrap_err();
        assert_eq!(err.code_str(), "firestore/invalid-argument");
    }

    #[test]
    fn page_request_builder() {
        let request = PageRequest::new()
            .page_size(20)
            .page_token("abc")
            .order_by(OrderBy::ascending("title").unwrap());
        assert_eq!(request.page_size, Some(20));
        assert_eq!(request.page_token.as_deref(), Some("abc"));
        assert_eq!(request.order_by.len(), 1);
    }

    #[test]
    fn cursor_helpers_set_inclusivity() {
        let options = QueryOptions::new()
            .start_after(vec![NativeValue::Integer(1)])
            .end_at(vec![NativeValue::Integer(9)]);
        assert!(!options.start_at.as_ref().unwrap().inclusive());
        assert!(options.end_at.as_ref().unwrap().inclusive());
    }
}
