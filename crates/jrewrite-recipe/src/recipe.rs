//! Named, composable recipes and the registry that looks them up.

use jrewrite_syntax::CompilationUnit;

use crate::engine::rewrite_annotations;
use crate::templates::remove_duplicate_test_templates;
use crate::{RewriteError, RewriteReport, RuleTable};

pub const UPDATE_ANNOTATIONS: &str = "junit5.update-annotations";
pub const REMOVE_DUPLICATE_TEST_TEMPLATES: &str = "junit5.remove-duplicate-test-templates";
pub const MIGRATION: &str = "junit5.migration";

/// A migration applied to one compilation unit at a time.
///
/// `apply` either succeeds and reports what it changed, or fails and leaves
/// the unit exactly as it was.
pub trait Recipe: Send + Sync {
    fn name(&self) -> &str;
    fn display_name(&self) -> &str;
    fn description(&self) -> &str;
    fn apply(&self, unit: &mut CompilationUnit) -> Result<RewriteReport, RewriteError>;
}

/// Rewrites annotations according to a [`RuleTable`].
#[derive(Debug, Clone)]
pub struct UpdateAnnotations {
    rules: RuleTable,
}

impl UpdateAnnotations {
    pub fn new(rules: RuleTable) -> Self {
        Self { rules }
    }

    pub fn junit5() -> Self {
        Self::new(RuleTable::junit5())
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }
}

impl Recipe for UpdateAnnotations {
    fn name(&self) -> &str {
        UPDATE_ANNOTATIONS
    }

    fn display_name(&self) -> &str {
        "Update JUnit 4 annotations to JUnit 5"
    }

    fn description(&self) -> &str {
        "Replaces @Before, @After, @BeforeClass, @AfterClass and @Ignore with their JUnit 5 \
         successors, fixing imports and dropping `public` from lifecycle methods."
    }

    fn apply(&self, unit: &mut CompilationUnit) -> Result<RewriteReport, RewriteError> {
        rewrite_annotations(unit, &self.rules)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveDuplicateTestTemplates;

impl Recipe for RemoveDuplicateTestTemplates {
    fn name(&self) -> &str {
        REMOVE_DUPLICATE_TEST_TEMPLATES
    }

    fn display_name(&self) -> &str {
        "Remove duplicate test templates"
    }

    fn description(&self) -> &str {
        "Removes @Test from methods also annotated with @RepeatedTest."
    }

    fn apply(&self, unit: &mut CompilationUnit) -> Result<RewriteReport, RewriteError> {
        Ok(remove_duplicate_test_templates(unit))
    }
}

/// Runs its recipes in order on a working copy and commits only if all succeed.
pub struct CompositeRecipe {
    name: String,
    display_name: String,
    description: String,
    recipes: Vec<Box<dyn Recipe>>,
}

impl CompositeRecipe {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        recipes: Vec<Box<dyn Recipe>>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: description.into(),
            recipes,
        }
    }

    /// The full JUnit 4 to JUnit 5 migration.
    pub fn junit5_migration(rules: RuleTable) -> Self {
        Self::new(
            MIGRATION,
            "Migrate JUnit 4 tests to JUnit 5",
            "Updates annotations, then removes duplicate test templates.",
            vec![
                Box::new(UpdateAnnotations::new(rules)),
                Box::new(RemoveDuplicateTestTemplates),
            ],
        )
    }

    pub fn recipes(&self) -> impl Iterator<Item = &dyn Recipe> {
        self.recipes.iter().map(|r| r.as_ref())
    }
}

impl Recipe for CompositeRecipe {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn apply(&self, unit: &mut CompilationUnit) -> Result<RewriteReport, RewriteError> {
        let mut working = unit.clone();
        let mut report = RewriteReport::default();
        for recipe in &self.recipes {
            let _span =
                tracing::debug_span!(target: "jrewrite.recipe", "recipe", recipe = recipe.name())
                    .entered();
            report.extend(recipe.apply(&mut working)?);
        }
        *unit = working;
        Ok(report)
    }
}

/// Recipes by name, in registration order.
#[derive(Default)]
pub struct RecipeRegistry {
    recipes: Vec<Box<dyn Recipe>>,
}

impl RecipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in recipes, with annotation rules taken from `rules`.
    pub fn with_defaults(rules: RuleTable) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(UpdateAnnotations::new(rules.clone())));
        registry.register(Box::new(RemoveDuplicateTestTemplates));
        registry.register(Box::new(CompositeRecipe::junit5_migration(rules)));
        registry
    }

    /// Add `recipe`, returning any recipe it replaced under the same name.
    pub fn register(&mut self, recipe: Box<dyn Recipe>) -> Option<Box<dyn Recipe>> {
        match self.recipes.iter().position(|r| r.name() == recipe.name()) {
            Some(idx) => Some(std::mem::replace(&mut self.recipes[idx], recipe)),
            None => {
                self.recipes.push(recipe);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Recipe> {
        self.recipes.iter().find(|r| r.name() == name).map(|r| r.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.recipes.iter().map(|r| r.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Recipe> {
        self.recipes.iter().map(|r| r.as_ref())
    }
}

/// Apply the default annotation rewrite to a copy of `unit`.
pub fn apply_recipe(unit: &CompilationUnit) -> Result<CompilationUnit, RewriteError> {
    let mut rewritten = unit.clone();
    UpdateAnnotations::junit5().apply(&mut rewritten)?;
    Ok(rewritten)
}
