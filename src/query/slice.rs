use std::fmt;

/// Base filter expression scoping the records a view contains
///
/// The empty slice selects every record of the entity type. A slice is
/// immutable; a different filter means a different view.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Slice {
    clause: String,
}

impl Slice {
    pub fn new(clause: impl Into<String>) -> Self {
        Slice {
            clause: clause.into().trim().to_string(),
        }
    }

    pub fn all() -> Self {
        Slice::default()
    }

    pub fn as_str(&self) -> &str {
        &self.clause
    }

    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }
}

impl From<&str> for Slice {
    fn from(clause: &str) -> Self {
        Slice::new(clause)
    }
}

impl From<String> for Slice {
    fn from(clause: String) -> Self {
        Slice::new(clause)
    }
}

impl From<Option<&str>> for Slice {
    fn from(clause: Option<&str>) -> Self {
        clause.map(Slice::new).unwrap_or_default()
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clause)
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slice({:?})", self.clause)
    }
}
