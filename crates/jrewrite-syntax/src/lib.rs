//! Java source model for annotation rewriting.
//!
//! [`JavaParser`] turns source text into a [`CompilationUnit`] that keeps
//! package, imports, type declarations and their members with annotations
//! and modifiers. [`JavaPrinter`] renders a unit back to text, splicing
//! changes into the original source when there is one.

pub mod ast;
mod lexer;
mod parser;
mod printer;

pub use ast::{
    simple_name, Annotation, CompilationUnit, Declaration, DeclarationKind, DeclarationMut,
    FieldDecl, ImportDecl, InitializerDecl, MemberDecl, MethodDecl, Modifier, ModifierKeyword,
    PackageDecl, TypeDecl, TypeKind, UnmodelledAnnotation,
};
pub use printer::PrintError;

use jrewrite_core::{LineCol, LineIndex, TextRange};
use thiserror::Error;

/// Syntax error reported by the parser. `range` points into the parsed text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
}

impl ParseError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }

    /// Zero-based position of the error start in `text`.
    pub fn line_col(&self, text: &str) -> LineCol {
        LineIndex::new(text).line_col(self.range.start())
    }
}

/// Something that can turn source text into a [`CompilationUnit`].
pub trait ParseSource {
    fn parse(&self, text: &str) -> Result<CompilationUnit, ParseError>;
}

/// Something that can render a [`CompilationUnit`] as source text.
pub trait PrintSource {
    fn print(&self, unit: &CompilationUnit) -> Result<String, PrintError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JavaParser;

impl ParseSource for JavaParser {
    fn parse(&self, text: &str) -> Result<CompilationUnit, ParseError> {
        parser::parse_compilation_unit(text)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JavaPrinter;

impl PrintSource for JavaPrinter {
    fn print(&self, unit: &CompilationUnit) -> Result<String, PrintError> {
        printer::print_unit(unit)
    }
}

pub fn parse_java(text: &str) -> Result<CompilationUnit, ParseError> {
    JavaParser.parse(text)
}

pub fn print_java(unit: &CompilationUnit) -> Result<String, PrintError> {
    JavaPrinter.print(unit)
}

/// Render `unit` as an outline, ignoring any source it was parsed from.
pub fn render_outline(unit: &CompilationUnit) -> String {
    printer::render_outline(unit)
}
