use std::fmt;

use serde::Serialize;

/// One edit made by a recipe. `location` is the dotted path of the
/// declaration, e.g. `ExampleTest.Nested.initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    AnnotationRenamed {
        location: String,
        from: String,
        to: String,
    },
    AnnotationRemoved {
        location: String,
        annotation: String,
    },
    ModifierRemoved {
        location: String,
        modifier: String,
    },
    ImportAdded {
        import: String,
    },
    ImportRemoved {
        import: String,
    },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::AnnotationRenamed { location, from, to } => {
                write!(f, "{location}: @{from} -> @{to}")
            }
            Change::AnnotationRemoved {
                location,
                annotation,
            } => write!(f, "{location}: removed @{annotation}"),
            Change::ModifierRemoved { location, modifier } => {
                write!(f, "{location}: removed `{modifier}`")
            }
            Change::ImportAdded { import } => write!(f, "+ import {import}"),
            Change::ImportRemoved { import } => write!(f, "- import {import}"),
        }
    }
}

/// Everything a recipe changed in one unit. Empty means the unit was left as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    pub changes: Vec<Change>,
}

impl RewriteReport {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn extend(&mut self, other: RewriteReport) {
        self.changes.extend(other.changes);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }
}
