//! Import additions and removals collected while planning a rewrite.

use jrewrite_syntax::{CompilationUnit, ImportDecl};

use crate::{Change, RewriteError, RewriteReport};

#[derive(Debug, Default)]
pub(crate) struct ImportPlan {
    remove: Vec<String>,
    /// Each addition with the first declaration that needs it.
    add: Vec<(ImportDecl, String)>,
}

impl ImportPlan {
    pub(crate) fn remove(&mut self, path: &str) {
        if !self.remove.iter().any(|p| p == path) {
            self.remove.push(path.to_string());
        }
    }

    /// Queue `path` unless the unit or the plan already imports it.
    pub(crate) fn add(&mut self, unit: &CompilationUnit, path: &str, location: &str) {
        let import = ImportDecl::single(path);
        if unit.has_import(&import) || self.add.iter().any(|(queued, _)| queued.same_as(&import)) {
            return;
        }
        self.add.push((import, location.to_string()));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }

    /// Reject additions whose simple name is already taken by a kept import,
    /// another addition, or a type declared in the unit.
    pub(crate) fn check(&self, unit: &CompilationUnit) -> Result<(), RewriteError> {
        for (import, location) in &self.add {
            let name = import.simple_name();
            let clash = unit
                .single_type_imports_named(name)
                .find(|existing| existing.path != import.path && !self.remove.contains(&existing.path))
                .map(|existing| existing.path.clone())
                .or_else(|| {
                    self.add
                        .iter()
                        .find(|(other, _)| other.simple_name() == name && other.path != import.path)
                        .map(|(other, _)| other.path.clone())
                })
                .or_else(|| {
                    unit.declared_type_names()
                        .into_iter()
                        .find(|declared| *declared == name)
                        .map(str::to_string)
                });

            if let Some(conflicting) = clash {
                return Err(RewriteError::UnresolvedImport {
                    import: import.path.clone(),
                    conflicting,
                    location: location.clone(),
                });
            }
        }
        Ok(())
    }

    /// Drop removed imports and put additions where the first removed import
    /// stood, or after the last import when nothing was removed.
    pub(crate) fn apply(self, unit: &mut CompilationUnit, report: &mut RewriteReport) {
        let mut first_removed = None;
        let mut kept = Vec::with_capacity(unit.imports.len() + self.add.len());
        for import in unit.imports.drain(..) {
            if import.is_single_type() && self.remove.contains(&import.path) {
                first_removed.get_or_insert(kept.len());
                report.push(Change::ImportRemoved {
                    import: import.path.clone(),
                });
                continue;
            }
            kept.push(import);
        }

        let at = first_removed.unwrap_or(kept.len());
        let mut additions = Vec::with_capacity(self.add.len());
        for (import, _) in self.add {
            tracing::debug!(target: "jrewrite.recipe", import = %import.path, "adding import");
            report.push(Change::ImportAdded {
                import: import.path.clone(),
            });
            additions.push(import);
        }
        kept.splice(at..at, additions);
        unit.imports = kept;
    }
}
