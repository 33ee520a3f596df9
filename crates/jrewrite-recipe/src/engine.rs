//! The annotation rewrite engine.
//!
//! Rewriting happens in two passes. Planning walks every declaration,
//! resolves annotation names against the unit's imports and checks for
//! conflicts without touching anything. Only a plan that passed every check
//! is applied, so an error always leaves the unit as it was.

use std::collections::HashSet;

use jrewrite_syntax::{simple_name, CompilationUnit, DeclarationKind, ModifierKeyword};

use crate::imports::ImportPlan;
use crate::resolve::{resolve, Resolution};
use crate::{Change, ModifierPolicy, RewriteError, RewriteReport, RewriteRule, RuleTable};

struct Hit<'r> {
    /// Index into `CompilationUnit::declarations`.
    decl: usize,
    annotation: usize,
    rule: &'r RewriteRule,
    /// The annotation was written as a simple name bound by an import.
    imported: bool,
}

struct Plan<'r> {
    hits: Vec<Hit<'r>>,
    imports: ImportPlan,
}

/// Rewrite every annotation in `unit` that has a rule in `rules`.
pub fn rewrite_annotations(
    unit: &mut CompilationUnit,
    rules: &RuleTable,
) -> Result<RewriteReport, RewriteError> {
    let plan = plan(unit, rules)?;
    if plan.hits.is_empty() {
        return Ok(RewriteReport::default());
    }
    Ok(apply(unit, plan))
}

fn plan<'r>(unit: &CompilationUnit, rules: &'r RuleTable) -> Result<Plan<'r>, RewriteError> {
    let declarations = unit.declarations();
    let mut hits = Vec::new();
    // Import paths still referenced by annotations the rewrite leaves alone.
    let mut still_referenced: HashSet<String> = HashSet::new();

    for (decl_idx, decl) in declarations.iter().enumerate() {
        for (ann_idx, annotation) in decl.annotations.iter().enumerate() {
            let resolution = resolve(unit, &annotation.name);
            match &resolution {
                Resolution::Qualified(name) | Resolution::Imported(name) => {
                    match rules.get(name) {
                        Some(rule) => hits.push(Hit {
                            decl: decl_idx,
                            annotation: ann_idx,
                            rule,
                            imported: resolution.is_imported(),
                        }),
                        None if resolution.is_imported() => {
                            still_referenced.insert(name.clone());
                        }
                        None => {}
                    }
                }
                Resolution::Ambiguous(paths) => {
                    if let Some(ruled) = paths.iter().find(|p| rules.get(p).is_some()) {
                        let other = paths.iter().find(|p| *p != ruled).unwrap_or(ruled);
                        return Err(RewriteError::RuleConflict {
                            annotation: annotation.name.clone(),
                            first: ruled.clone(),
                            second: other.clone(),
                            location: Some(decl.location.clone()),
                        });
                    }
                    still_referenced.extend(paths.iter().cloned());
                }
                Resolution::Unresolved => {}
            }
        }
    }

    for annotation in unit.unmodelled_annotations() {
        let ruled = match resolve(unit, &annotation.name) {
            Resolution::Qualified(name) | Resolution::Imported(name) => {
                rules.get(&name).map(|_| name)
            }
            Resolution::Ambiguous(paths) => paths.into_iter().find(|p| rules.get(p).is_some()),
            Resolution::Unresolved => None,
        };
        if let Some(source_annotation) = ruled {
            return Err(RewriteError::UnreachableAnnotation {
                annotation: annotation.name.clone(),
                source_annotation,
                location: annotation.position.to_string(),
            });
        }
    }

    let mut imports = ImportPlan::default();
    for hit in hits.iter().filter(|hit| hit.imported) {
        if !still_referenced.contains(hit.rule.source()) {
            imports.remove(hit.rule.source());
        }
        imports.add(unit, hit.rule.target_import(), &declarations[hit.decl].location);
    }
    imports.check(unit)?;

    Ok(Plan { hits, imports })
}

fn apply(unit: &mut CompilationUnit, plan: Plan<'_>) -> RewriteReport {
    let mut report = RewriteReport::default();
    let mut hits = plan.hits.iter().peekable();
    let mut decl_idx = 0;

    unit.for_each_declaration_mut(|decl| {
        let idx = decl_idx;
        decl_idx += 1;

        let mut force_package_private = false;
        while let Some(hit) = hits.next_if(|hit| hit.decl == idx) {
            let target = if hit.imported {
                simple_name(hit.rule.target())
            } else {
                hit.rule.target()
            };
            let annotation = &mut decl.annotations[hit.annotation];
            let from = std::mem::replace(&mut annotation.name, target.to_string());
            tracing::debug!(
                target: "jrewrite.recipe",
                location = decl.location,
                from = %from,
                to = target,
                "rewrote annotation"
            );
            report.push(Change::AnnotationRenamed {
                location: decl.location.to_string(),
                from,
                to: target.to_string(),
            });
            force_package_private |= hit.rule.modifier_policy() == ModifierPolicy::ForcePackagePrivate;
        }

        let is_method = matches!(decl.kind, DeclarationKind::Method | DeclarationKind::Constructor);
        if force_package_private && is_method {
            let before = decl.modifiers.len();
            decl.modifiers.retain(|m| m.keyword != ModifierKeyword::Public);
            if decl.modifiers.len() != before {
                report.push(Change::ModifierRemoved {
                    location: decl.location.to_string(),
                    modifier: ModifierKeyword::Public.as_str().to_string(),
                });
            }
        }
    });

    plan.imports.apply(unit, &mut report);
    report
}
