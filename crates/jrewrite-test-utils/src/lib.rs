//! Helpers shared by jrewrite tests.
//!
//! [`RecipeTester`] runs a recipe over an inline Java snippet and compares
//! the printed result with the expected snippet. Snippets are usually
//! written as indented raw strings and normalized with [`trim_indent`].

use jrewrite_recipe::{Recipe, RewriteError, RewriteReport, UpdateAnnotations};
use jrewrite_syntax::{parse_java, print_java, CompilationUnit};
use pretty_assertions::assert_eq;

/// Strip a leading and a trailing blank line and the indentation shared by
/// all non-blank lines. Blank lines become empty; there is no trailing newline.
pub fn trim_indent(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| if l.trim().is_empty() { "" } else { &l[indent..] })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct RecipeTester {
    recipe: Box<dyn Recipe>,
}

impl RecipeTester {
    pub fn new(recipe: impl Recipe + 'static) -> Self {
        Self {
            recipe: Box::new(recipe),
        }
    }

    /// A tester for the default JUnit 5 annotation rewrite.
    pub fn junit5() -> Self {
        Self::new(UpdateAnnotations::junit5())
    }

    pub fn recipe(&self) -> &dyn Recipe {
        self.recipe.as_ref()
    }

    fn parse(&self, text: &str) -> CompilationUnit {
        parse_java(text).unwrap_or_else(|err| {
            let pos = err.line_col(text);
            panic!("fixture does not parse at {pos}: {err}\n{text}")
        })
    }

    /// Run the recipe on `source` (taken as is), returning the printed result.
    pub fn try_rewrite(&self, source: &str) -> Result<(String, RewriteReport), RewriteError> {
        let mut unit = self.parse(source);
        let report = self.recipe.apply(&mut unit)?;
        let printed = print_java(&unit).unwrap_or_else(|err| panic!("cannot print result: {err}"));
        Ok((printed, report))
    }

    /// Assert that the recipe turns `before` into `after`, and that running
    /// it again on the result changes nothing.
    #[track_caller]
    pub fn assert_changed(&self, before: &str, after: &str) -> RewriteReport {
        let before = trim_indent(before);
        let after = trim_indent(after);

        let (actual, report) = self
            .try_rewrite(&before)
            .unwrap_or_else(|err| panic!("`{}` failed: {err}", self.recipe.name()));
        assert_eq!(actual, after);
        assert!(!report.is_empty(), "text changed but nothing was reported");

        let (second, again) = self
            .try_rewrite(&actual)
            .unwrap_or_else(|err| panic!("second run of `{}` failed: {err}", self.recipe.name()));
        assert_eq!(second, actual, "recipe is not idempotent");
        assert!(again.is_empty(), "second run reported changes: {again:?}");
        report
    }

    #[track_caller]
    pub fn assert_unchanged(&self, source: &str) {
        let source = trim_indent(source);
        let (actual, report) = self
            .try_rewrite(&source)
            .unwrap_or_else(|err| panic!("`{}` failed: {err}", self.recipe.name()));
        assert_eq!(actual, source);
        assert!(report.is_empty(), "unexpected changes: {report:?}");
    }

    /// Assert that the recipe rejects `source` and leaves the unit untouched.
    #[track_caller]
    pub fn assert_fails(&self, source: &str) -> RewriteError {
        let source = trim_indent(source);
        let mut unit = self.parse(&source);
        let original = unit.clone();
        match self.recipe.apply(&mut unit) {
            Ok(report) => panic!("expected `{}` to fail, it reported {report:?}", self.recipe.name()),
            Err(err) => {
                assert_eq!(unit, original, "failed rewrite modified the unit");
                tracing::debug!(target: "jrewrite.test", error = %err, "recipe failed as expected");
                err
            }
        }
    }
}
