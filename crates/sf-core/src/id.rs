use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier of a page. Survives reordering; duplicating a page
/// mints a new one.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Mint a fresh random id.
    pub fn fresh() -> Self {
        PageId(Uuid::new_v4().to_string())
    }

    /// Wrap an id issued elsewhere (e.g. by the design store).
    pub fn new(id: impl Into<String>) -> Self {
        PageId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page:{}", self.0)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a design record in the persistence API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesignId(String);

impl DesignId {
    pub fn new(id: impl Into<String>) -> Self {
        DesignId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DesignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_unique() {
        let a = PageId::fresh();
        let b = PageId::fresh();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = PageId::new("p1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p1\"");
        let back: PageId = serde_json::from_str("\"p1\"").unwrap();
        assert_eq!(back, id);
    }
}
