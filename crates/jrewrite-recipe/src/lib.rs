//! JUnit 4 to JUnit 5 annotation migration.
//!
//! The heart of the crate is a [`RuleTable`] mapping JUnit 4 annotations to
//! their JUnit 5 successors. Recipes apply it to a
//! [`jrewrite_syntax::CompilationUnit`], fixing imports and modifiers along
//! the way, and report each change they make.

mod engine;
mod error;
mod imports;
mod recipe;
mod report;
mod resolve;
mod rule;
mod templates;

pub use engine::rewrite_annotations;
pub use error::RewriteError;
pub use recipe::{
    apply_recipe, CompositeRecipe, Recipe, RecipeRegistry, RemoveDuplicateTestTemplates,
    UpdateAnnotations, MIGRATION, REMOVE_DUPLICATE_TEST_TEMPLATES, UPDATE_ANNOTATIONS,
};
pub use report::{Change, RewriteReport};
pub use rule::{junit5_rules, ModifierPolicy, RewriteRule, RuleTable};
