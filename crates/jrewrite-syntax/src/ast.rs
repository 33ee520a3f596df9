//! Structural model of a Java compilation unit.
//!
//! The model keeps declarations, annotations, modifiers and imports. Method
//! bodies and field initializers are not modelled; a parsed unit remembers its
//! source text so the printer can splice changes back into it.

use jrewrite_core::{LineCol, TextRange, TextSize};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilationUnit {
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unmodelled_annotations: Vec<UnmodelledAnnotation>,
    #[serde(skip)]
    source: Option<SourceSnapshot>,
}

/// An annotation the parser stepped over without modelling it: on an enum
/// constant, a parameter or a type use, or anywhere inside a skipped body or
/// initializer (anonymous and local classes included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmodelledAnnotation {
    /// The name as written.
    pub name: String,
    pub position: LineCol,
    #[serde(skip)]
    pub range: TextRange,
}

/// Original text plus the spans present at parse time.
///
/// Anything in the baseline that is missing from the current model has been
/// removed; model nodes without a range have been added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceSnapshot {
    pub(crate) text: String,
    pub(crate) imports: Vec<TextRange>,
    pub(crate) annotations: Vec<TextRange>,
    pub(crate) modifiers: Vec<TextRange>,
}

impl CompilationUnit {
    pub fn new(package: Option<PackageDecl>, imports: Vec<ImportDecl>, types: Vec<TypeDecl>) -> Self {
        Self {
            package,
            imports,
            types,
            unmodelled_annotations: Vec::new(),
            source: None,
        }
    }

    pub(crate) fn with_unmodelled_annotations(
        mut self,
        annotations: Vec<UnmodelledAnnotation>,
    ) -> Self {
        self.unmodelled_annotations = annotations;
        self
    }

    /// Annotations present in the source but outside the declaration model.
    /// Rewrites cannot reach them, but they still use their imports.
    pub fn unmodelled_annotations(&self) -> &[UnmodelledAnnotation] {
        &self.unmodelled_annotations
    }

    /// Attach the text this unit was parsed from and record its current spans
    /// as the printing baseline.
    pub(crate) fn with_source(mut self, text: &str) -> Self {
        let mut annotations = Vec::new();
        let mut modifiers = Vec::new();
        for decl in self.declarations() {
            annotations.extend(decl.annotations.iter().filter_map(|a| a.range));
            modifiers.extend(decl.modifiers.iter().filter_map(|m| m.range));
        }
        let imports = self.imports.iter().filter_map(|i| i.range).collect();
        self.source = Some(SourceSnapshot {
            text: text.to_string(),
            imports,
            annotations,
            modifiers,
        });
        self
    }

    pub(crate) fn snapshot(&self) -> Option<&SourceSnapshot> {
        self.source.as_ref()
    }

    /// The text this unit was parsed from, if any.
    pub fn source_text(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.text.as_str())
    }

    pub fn has_import(&self, import: &ImportDecl) -> bool {
        self.imports.iter().any(|existing| existing.same_as(import))
    }

    /// Single-type (non-static, non-wildcard) imports whose simple name is `simple_name`.
    pub fn single_type_imports_named<'a>(
        &'a self,
        simple_name: &'a str,
    ) -> impl Iterator<Item = &'a ImportDecl> + 'a {
        self.imports
            .iter()
            .filter(move |i| i.is_single_type() && i.simple_name() == simple_name)
    }

    /// Every type, method, constructor and field declaration in source order,
    /// nested types included.
    pub fn declarations(&self) -> Vec<Declaration<'_>> {
        let mut out = Vec::new();
        for ty in &self.types {
            collect_declarations(ty, &ty.name, &mut out);
        }
        out
    }

    /// Visit every declaration mutably, in the same order as [`Self::declarations`].
    pub fn for_each_declaration_mut(&mut self, mut f: impl FnMut(DeclarationMut<'_>)) {
        for ty in &mut self.types {
            let location = ty.name.clone();
            walk_type_mut(ty, &location, &mut f);
        }
    }

    /// All type names declared in this unit, nested types included.
    pub fn declared_type_names(&self) -> Vec<&str> {
        self.declarations()
            .into_iter()
            .filter(|d| matches!(d.kind, DeclarationKind::Type(_)))
            .map(|d| d.name)
            .collect()
    }
}

fn collect_declarations<'a>(ty: &'a TypeDecl, location: &str, out: &mut Vec<Declaration<'a>>) {
    out.push(Declaration {
        kind: DeclarationKind::Type(ty.kind),
        name: &ty.name,
        location: location.to_string(),
        annotations: &ty.annotations,
        modifiers: &ty.modifiers,
        signature_start: ty.signature_start,
    });
    for member in &ty.members {
        match member {
            MemberDecl::Method(method) => out.push(Declaration {
                kind: if method.is_constructor {
                    DeclarationKind::Constructor
                } else {
                    DeclarationKind::Method
                },
                name: &method.name,
                location: format!("{location}.{}", method.name),
                annotations: &method.annotations,
                modifiers: &method.modifiers,
                signature_start: method.signature_start,
            }),
            MemberDecl::Field(field) => out.push(Declaration {
                kind: DeclarationKind::Field,
                name: &field.name,
                location: format!("{location}.{}", field.name),
                annotations: &field.annotations,
                modifiers: &field.modifiers,
                signature_start: field.signature_start,
            }),
            MemberDecl::Type(nested) => {
                collect_declarations(nested, &format!("{location}.{}", nested.name), out)
            }
            MemberDecl::Initializer(_) => {}
        }
    }
}

fn walk_type_mut(ty: &mut TypeDecl, location: &str, f: &mut dyn FnMut(DeclarationMut<'_>)) {
    f(DeclarationMut {
        kind: DeclarationKind::Type(ty.kind),
        location,
        annotations: &mut ty.annotations,
        modifiers: &mut ty.modifiers,
    });
    for member in &mut ty.members {
        match member {
            MemberDecl::Method(method) => {
                let member_location = format!("{location}.{}", method.name);
                f(DeclarationMut {
                    kind: if method.is_constructor {
                        DeclarationKind::Constructor
                    } else {
                        DeclarationKind::Method
                    },
                    location: &member_location,
                    annotations: &mut method.annotations,
                    modifiers: &mut method.modifiers,
                });
            }
            MemberDecl::Field(field) => {
                let member_location = format!("{location}.{}", field.name);
                f(DeclarationMut {
                    kind: DeclarationKind::Field,
                    location: &member_location,
                    annotations: &mut field.annotations,
                    modifiers: &mut field.modifiers,
                });
            }
            MemberDecl::Type(nested) => {
                let nested_location = format!("{location}.{}", nested.name);
                walk_type_mut(nested, &nested_location, f);
            }
            MemberDecl::Initializer(_) => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Type(TypeKind),
    Method,
    Constructor,
    Field,
}

/// Read-only view of an annotated declaration.
#[derive(Debug, Clone)]
pub struct Declaration<'a> {
    pub kind: DeclarationKind,
    pub name: &'a str,
    /// Dotted path of enclosing types plus the declaration name, e.g. `Outer.Inner.run`.
    pub location: String,
    pub annotations: &'a [Annotation],
    pub modifiers: &'a [Modifier],
    pub signature_start: Option<TextSize>,
}

/// Mutable view of an annotated declaration.
#[derive(Debug)]
pub struct DeclarationMut<'a> {
    pub kind: DeclarationKind,
    pub location: &'a str,
    pub annotations: &'a mut Vec<Annotation>,
    pub modifiers: &'a mut Vec<Modifier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDecl {
    pub name: String,
    #[serde(skip)]
    pub range: Option<TextRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportDecl {
    pub path: String,
    pub is_static: bool,
    pub is_wildcard: bool,
    #[serde(skip)]
    pub range: Option<TextRange>,
}

impl ImportDecl {
    /// A new `import a.b.C;` that is not part of any source text yet.
    pub fn single(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_static: false,
            is_wildcard: false,
            range: None,
        }
    }

    pub fn is_single_type(&self) -> bool {
        !self.is_static && !self.is_wildcard
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.path)
    }

    /// Set semantics for imports: position in the source does not matter.
    pub fn same_as(&self, other: &ImportDecl) -> bool {
        self.path == other.path
            && self.is_static == other.is_static
            && self.is_wildcard == other.is_wildcard
    }

    pub fn render(&self) -> String {
        let mut out = String::from("import ");
        if self.is_static {
            out.push_str("static ");
        }
        out.push_str(&self.path);
        if self.is_wildcard {
            out.push_str(".*");
        }
        out.push(';');
        out
    }
}

/// The last segment of a dotted name.
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl TypeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
            TypeKind::Annotation => "@interface",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub modifiers: Vec<Modifier>,
    pub members: Vec<MemberDecl>,
    /// Offset of the declaration keyword; new annotations and modifiers go here.
    #[serde(skip)]
    pub signature_start: Option<TextSize>,
}

impl TypeDecl {
    pub fn new(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            annotations: Vec::new(),
            modifiers: Vec::new(),
            members: Vec::new(),
            signature_start: None,
        }
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            MemberDecl::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberDecl {
    Method(MethodDecl),
    Field(FieldDecl),
    Initializer(InitializerDecl),
    Type(TypeDecl),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub is_constructor: bool,
    pub annotations: Vec<Annotation>,
    pub modifiers: Vec<Modifier>,
    /// Whitespace-normalized text between the modifiers and the body,
    /// e.g. `void initialize()`.
    pub signature: String,
    pub has_body: bool,
    #[serde(skip)]
    pub signature_start: Option<TextSize>,
}

impl MethodDecl {
    /// A `void name()` method with an empty body.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            signature: format!("void {name}()"),
            name,
            is_constructor: false,
            annotations: Vec::new(),
            modifiers: Vec::new(),
            has_body: true,
            signature_start: None,
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_modifier(mut self, keyword: ModifierKeyword) -> Self {
        self.modifiers.push(Modifier::new(keyword));
        self
    }

    pub fn has_modifier(&self, keyword: ModifierKeyword) -> bool {
        self.modifiers.iter().any(|m| m.keyword == keyword)
    }

    pub fn annotation_names(&self) -> Vec<&str> {
        self.annotations.iter().map(|a| a.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDecl {
    /// Name of the first declarator.
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub modifiers: Vec<Modifier>,
    pub signature: String,
    #[serde(skip)]
    pub signature_start: Option<TextSize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitializerDecl {
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    /// The name as written: simple (`Before`) or qualified (`org.junit.Before`).
    pub name: String,
    /// Raw text between the parentheses, kept verbatim.
    pub arguments: Option<String>,
    #[serde(skip)]
    pub range: Option<TextRange>,
    #[serde(skip)]
    pub name_range: Option<TextRange>,
}

impl Annotation {
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
            range: None,
            name_range: None,
        }
    }

    pub fn with_arguments(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            arguments: Some(arguments.into()),
            ..Self::marker(name)
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.name.contains('.')
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// The value of a single string-literal argument such as `("not ready yet")`.
    pub fn string_argument(&self) -> Option<String> {
        let raw = self.arguments.as_deref()?.trim();
        let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
        unescape_string(inner)
    }

    pub fn render(&self) -> String {
        match &self.arguments {
            Some(args) => format!("@{}({args})", self.name),
            None => format!("@{}", self.name),
        }
    }
}

fn unescape_string(inner: &str) -> Option<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            // An unescaped quote means this was more than one literal.
            '"' => return None,
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                's' => out.push(' '),
                '0' => out.push('\0'),
                other => out.push(other),
            },
            other => out.push(other),
        }
    }
    Some(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModifierKeyword {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Default,
    Synchronized,
    Native,
    Transient,
    Volatile,
    Strictfp,
    Sealed,
    NonSealed,
}

impl ModifierKeyword {
    pub fn from_keyword(text: &str) -> Option<Self> {
        let keyword = match text {
            "public" => ModifierKeyword::Public,
            "protected" => ModifierKeyword::Protected,
            "private" => ModifierKeyword::Private,
            "static" => ModifierKeyword::Static,
            "final" => ModifierKeyword::Final,
            "abstract" => ModifierKeyword::Abstract,
            "default" => ModifierKeyword::Default,
            "synchronized" => ModifierKeyword::Synchronized,
            "native" => ModifierKeyword::Native,
            "transient" => ModifierKeyword::Transient,
            "volatile" => ModifierKeyword::Volatile,
            "strictfp" => ModifierKeyword::Strictfp,
            "sealed" => ModifierKeyword::Sealed,
            "non-sealed" => ModifierKeyword::NonSealed,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModifierKeyword::Public => "public",
            ModifierKeyword::Protected => "protected",
            ModifierKeyword::Private => "private",
            ModifierKeyword::Static => "static",
            ModifierKeyword::Final => "final",
            ModifierKeyword::Abstract => "abstract",
            ModifierKeyword::Default => "default",
            ModifierKeyword::Synchronized => "synchronized",
            ModifierKeyword::Native => "native",
            ModifierKeyword::Transient => "transient",
            ModifierKeyword::Volatile => "volatile",
            ModifierKeyword::Strictfp => "strictfp",
            ModifierKeyword::Sealed => "sealed",
            ModifierKeyword::NonSealed => "non-sealed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modifier {
    pub keyword: ModifierKeyword,
    #[serde(skip)]
    pub range: Option<TextRange>,
}

impl Modifier {
    pub fn new(keyword: ModifierKeyword) -> Self {
        Self {
            keyword,
            range: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_argument_unescapes_single_literal() {
        let ann = Annotation::with_arguments("Ignore", r#""not \"ready\" yet""#);
        assert_eq!(ann.string_argument().as_deref(), Some("not \"ready\" yet"));

        let concat = Annotation::with_arguments("Ignore", r#""a" + "b""#);
        assert_eq!(concat.string_argument(), None);

        let named = Annotation::with_arguments("Test", "timeout = 10");
        assert_eq!(named.string_argument(), None);
    }

    #[test]
    fn import_set_semantics_ignore_ranges() {
        let mut parsed = ImportDecl::single("org.junit.Before");
        parsed.range = Some(jrewrite_core::range_of(0, 24));
        assert!(parsed.same_as(&ImportDecl::single("org.junit.Before")));
        assert_eq!(parsed.simple_name(), "Before");
        assert_eq!(parsed.render(), "import org.junit.Before;");
    }
}
