use thiserror::Error;

/// Why a recipe refused to rewrite a unit.
///
/// Every variant is raised before the unit is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// Two rules claim the same annotation, or a written name is bound to
    /// more than one import while a rule applies to one of them.
    #[error("conflicting rules for `{annotation}`{}: `{first}` and `{second}`", at(.location))]
    RuleConflict {
        annotation: String,
        first: String,
        second: String,
        location: Option<String>,
    },

    /// Importing the replacement would shadow or clash with an existing name.
    #[error("cannot import `{import}` for `{location}`: `{conflicting}` already uses that name")]
    UnresolvedImport {
        import: String,
        conflicting: String,
        location: String,
    },

    /// A ruled annotation sits outside every declaration header, for example
    /// on an enum constant or inside an anonymous class.
    #[error("cannot rewrite `@{annotation}` at {location}: it resolves to `{source_annotation}` but is not on a rewritable declaration")]
    UnreachableAnnotation {
        annotation: String,
        source_annotation: String,
        location: String,
    },

    #[error("invalid rule `{rule}`: {reason}")]
    InvalidRule { rule: String, reason: String },
}

fn at(location: &Option<String>) -> String {
    match location {
        Some(location) => format!(" at `{location}`"),
        None => String::new(),
    }
}
