//! Binding written annotation names to qualified names.
//!
//! Only what the unit itself says is used: a name written fully qualified, or
//! a simple name bound by a single-type import. Wildcard and static imports
//! and same-package types are never consulted.

use jrewrite_syntax::CompilationUnit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    Qualified(String),
    Imported(String),
    /// Several distinct single-type imports share the simple name.
    Ambiguous(Vec<String>),
    Unresolved,
}

impl Resolution {
    pub(crate) fn qualified(&self) -> Option<&str> {
        match self {
            Resolution::Qualified(name) | Resolution::Imported(name) => Some(name),
            Resolution::Ambiguous(_) | Resolution::Unresolved => None,
        }
    }

    pub(crate) fn is_imported(&self) -> bool {
        matches!(self, Resolution::Imported(_))
    }
}

pub(crate) fn resolve(unit: &CompilationUnit, written: &str) -> Resolution {
    if written.contains('.') {
        return Resolution::Qualified(written.to_string());
    }

    let mut paths: Vec<String> = Vec::new();
    for import in unit.single_type_imports_named(written) {
        if !paths.contains(&import.path) {
            paths.push(import.path.clone());
        }
    }

    match paths.len() {
        0 => Resolution::Unresolved,
        1 => Resolution::Imported(paths.remove(0)),
        _ => Resolution::Ambiguous(paths),
    }
}
