use crate::records::Attribute;

/// Equality-filter query against the record store.
///
/// Built fluently and handed to [`crate::RecordStore::query`]:
///
/// ```ignore
/// let records = store
///     .query(
///         RecordQuery::new()
///             .attribute_eq("token", "bitcoin")
///             .owned_by(address)
///             .with_payload(true),
///     )
///     .await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct RecordQuery {
    pub attributes: Vec<Attribute>,
    pub owner: Option<String>,
    pub with_payload: bool,
    pub limit: Option<usize>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `attributes[key] == value` on matching records.
    pub fn attribute_eq(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(key, value));
        self
    }

    /// Restrict results to records created by `owner`.
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Request payload bytes alongside keys and attributes.
    pub fn with_payload(mut self, with_payload: bool) -> Self {
        self.with_payload = with_payload;
        self
    }

    /// Cap the result set to the `limit` most recent records.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
