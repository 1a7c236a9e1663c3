use std::fmt;

use super::model::RawFeedItem;

/// Entry field an identity can be drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    Id,
    Link,
    Title,
}

impl IdentityField {
    fn tag(self) -> &'static str {
        match self {
            IdentityField::Id => "id",
            IdentityField::Link => "link",
            IdentityField::Title => "title",
        }
    }

    fn value(self, item: &RawFeedItem) -> Option<&str> {
        let value = match self {
            IdentityField::Id => item.id.as_deref(),
            IdentityField::Link => item.link.as_deref(),
            IdentityField::Title => item.title.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Canonical identity of an entry: the winning field and its trimmed value.
///
/// Rendered as `"<field>:<value>"` so that an id and a link with the same
/// literal value never hash to the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    key: String,
    field: IdentityField,
}

impl Identity {
    pub fn new(field: IdentityField, value: &str) -> Self {
        Self {
            key: format!("{}:{}", field.tag(), value),
            field,
        }
    }

    pub fn field(&self) -> IdentityField {
        self.field
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.key.as_bytes()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Picks an entry's identity from the first non-blank field in priority order.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    priority: Vec<IdentityField>,
}

impl Default for IdentityResolver {
    /// Opaque id, then permalink, then title: the order least likely to change between fetches.
    fn default() -> Self {
        Self::with_priority(vec![
            IdentityField::Id,
            IdentityField::Link,
            IdentityField::Title,
        ])
    }
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(priority: Vec<IdentityField>) -> Self {
        Self { priority }
    }

    pub fn priority(&self) -> &[IdentityField] {
        &self.priority
    }

    /// Returns `None` when every field in the priority list is absent or blank.
    pub fn resolve(&self, item: &RawFeedItem) -> Option<Identity> {
        self.priority
            .iter()
            .find_map(|field| field.value(item).map(|value| Identity::new(*field, value)))
    }
}
