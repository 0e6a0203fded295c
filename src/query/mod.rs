//! Query composition for collection views
//!
//! Every remote call a view makes is scoped by a [`Filter`]: the view's base
//! [`Slice`] conjoined with an optional identity predicate.
//!
//! ```text
//! slice = ""           id = X          ->  objectId='X'
//! slice = "age > 30"   id = X          ->  age > 30 and objectId='X'
//! slice = "age > 30"   ids = [X, Y]    ->  age > 30 and objectId in ('X','Y')
//! slice = "age > 30"   (none)          ->  age > 30
//! ```
//!
//! The filter stays structured so that backends may either send the rendered
//! text or evaluate the parts directly.
use std::fmt;

mod slice;

pub use slice::Slice;

pub const IDENTITY_FIELD: &str = "objectId";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityPredicate {
    /// No identity restriction
    Any,
    Eq(String),
    In(Vec<String>),
}

impl IdentityPredicate {
    pub fn matches(&self, object_id: Option<&str>) -> bool {
        match self {
            IdentityPredicate::Any => true,
            IdentityPredicate::Eq(id) => object_id == Some(id.as_str()),
            IdentityPredicate::In(ids) => {
                object_id.is_some_and(|candidate| ids.iter().any(|id| id == candidate))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    slice: Slice,
    identity: IdentityPredicate,
}

impl Filter {
    /// Everything the slice selects
    pub fn slice(slice: &Slice) -> Self {
        Filter {
            slice: slice.clone(),
            identity: IdentityPredicate::Any,
        }
    }

    /// `slice and objectId='id'`
    pub fn identity(slice: &Slice, id: impl Into<String>) -> Self {
        Filter {
            slice: slice.clone(),
            identity: IdentityPredicate::Eq(id.into()),
        }
    }

    /// `slice and objectId in ('id1','id2',...)`
    pub fn identities<I, S>(slice: &Slice, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter {
            slice: slice.clone(),
            identity: IdentityPredicate::In(ids.into_iter().map(Into::into).collect()),
        }
    }

    pub fn base(&self) -> &Slice {
        &self.slice
    }

    pub fn identity_predicate(&self) -> &IdentityPredicate {
        &self.identity
    }

    /// Render the identity predicate alone, `None` when unrestricted
    fn identity_clause(&self) -> Option<String> {
        match &self.identity {
            IdentityPredicate::Any => None,
            IdentityPredicate::Eq(id) => Some(format!("{IDENTITY_FIELD}={}", quote(id))),
            IdentityPredicate::In(ids) => {
                let list: Vec<String> = ids.iter().map(|id| quote(id)).collect();
                Some(format!("{IDENTITY_FIELD} in ({})", list.join(",")))
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.slice.is_empty(), self.identity_clause()) {
            (_, None) => write!(f, "{}", self.slice),
            (true, Some(clause)) => f.write_str(&clause),
            (false, Some(clause)) => write!(f, "{} and {}", self.slice, clause),
        }
    }
}

/// Single-quote a literal, doubling embedded quotes
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
