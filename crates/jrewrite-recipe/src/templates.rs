//! Drop `@Test` from methods that are already `@RepeatedTest` templates.
//!
//! JUnit 5 runs such a method once as a plain test and again per
//! repetition, so the plain `@Test` is a mistake.

use jrewrite_syntax::{CompilationUnit, DeclarationKind};

use crate::imports::ImportPlan;
use crate::resolve::resolve;
use crate::{Change, RewriteReport};

pub(crate) const TEST: &str = "org.junit.jupiter.api.Test";
pub(crate) const REPEATED_TEST: &str = "org.junit.jupiter.api.RepeatedTest";

pub(crate) fn remove_duplicate_test_templates(unit: &mut CompilationUnit) -> RewriteReport {
    let mut removals: Vec<(usize, Vec<usize>)> = Vec::new();
    let mut removed_imported = false;
    let mut kept_imported = false;

    for (decl_idx, decl) in unit.declarations().iter().enumerate() {
        let resolved: Vec<_> = decl.annotations.iter().map(|a| resolve(unit, &a.name)).collect();
        let is_template = decl.kind == DeclarationKind::Method
            && resolved.iter().any(|r| r.qualified() == Some(REPEATED_TEST));

        let mut doomed = Vec::new();
        for (idx, resolution) in resolved.iter().enumerate() {
            if resolution.qualified() != Some(TEST) {
                continue;
            }
            if is_template {
                doomed.push(idx);
                removed_imported |= resolution.is_imported();
            } else {
                kept_imported |= resolution.is_imported();
            }
        }
        if !doomed.is_empty() {
            removals.push((decl_idx, doomed));
        }
    }

    // Uses the declaration model cannot see still need the import.
    kept_imported |= unit.unmodelled_annotations().iter().any(|a| {
        let resolution = resolve(unit, &a.name);
        resolution.is_imported() && resolution.qualified() == Some(TEST)
    });

    let mut report = RewriteReport::default();
    if removals.is_empty() {
        return report;
    }

    let mut pending = removals.into_iter().peekable();
    let mut decl_idx = 0;
    unit.for_each_declaration_mut(|decl| {
        let idx = decl_idx;
        decl_idx += 1;
        let Some((_, doomed)) = pending.next_if(|(d, _)| *d == idx) else {
            return;
        };
        for &ann_idx in doomed.iter().rev() {
            let annotation = decl.annotations.remove(ann_idx);
            tracing::debug!(
                target: "jrewrite.recipe",
                location = decl.location,
                "removed @Test from repeated test"
            );
            report.push(Change::AnnotationRemoved {
                location: decl.location.to_string(),
                annotation: annotation.name,
            });
        }
    });

    if removed_imported && !kept_imported {
        let mut imports = ImportPlan::default();
        imports.remove(TEST);
        imports.apply(unit, &mut report);
    }
    report
}
