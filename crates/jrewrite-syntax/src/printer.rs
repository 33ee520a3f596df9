//! Rendering a [`CompilationUnit`] back to text.
//!
//! Parsed units are printed by splicing: only the tokens whose model changed
//! are edited and the rest of the original text is kept byte-for-byte.
//! Units built in memory have no source and are rendered as an outline.

use std::collections::HashSet;

use jrewrite_core::{apply_text_edits, range_of, EditError, TextEdit, TextRange, TextSize};
use thiserror::Error;

use crate::ast::{CompilationUnit, MemberDecl, SourceSnapshot, TypeDecl};

#[derive(Debug, Error)]
pub enum PrintError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("cannot place {what} on `{location}`: the declaration has no source position")]
    Unplaceable { what: String, location: String },
}

pub(crate) fn print_unit(unit: &CompilationUnit) -> Result<String, PrintError> {
    match unit.snapshot() {
        Some(snapshot) => {
            let edits = source_edits(unit, snapshot)?;
            tracing::trace!(target: "jrewrite.syntax", edits = edits.len(), "splicing source");
            Ok(apply_text_edits(&snapshot.text, &edits)?)
        }
        None => Ok(render_outline(unit)),
    }
}

pub(crate) fn source_edits(
    unit: &CompilationUnit,
    snapshot: &SourceSnapshot,
) -> Result<Vec<TextEdit>, PrintError> {
    let text = snapshot.text.as_str();
    let mut edits = Vec::new();
    let mut live_annotations = HashSet::new();
    let mut live_modifiers = HashSet::new();

    for decl in unit.declarations() {
        // Declarations added to a parsed unit have nowhere to go in the text.
        let Some(offset) = decl.signature_start else {
            return Err(PrintError::Unplaceable {
                what: decl.name.to_string(),
                location: decl.location,
            });
        };
        let mut pending = Vec::new();

        for annotation in decl.annotations {
            let (Some(range), Some(name_range)) = (annotation.range, annotation.name_range) else {
                pending.push(annotation.render());
                continue;
            };
            live_annotations.insert(range);

            let written: String = text[name_range].split_whitespace().collect();
            if written != annotation.name {
                edits.push(TextEdit::new(name_range, annotation.name.clone()));
            }

            let tail = TextRange::new(name_range.end(), range.end());
            let original_args = original_arguments(&text[tail]);
            if original_args != annotation.arguments.as_deref() {
                let replacement = annotation
                    .arguments
                    .as_ref()
                    .map(|args| format!("({args})"))
                    .unwrap_or_default();
                edits.push(TextEdit::new(tail, replacement));
            }
        }

        for modifier in decl.modifiers {
            match modifier.range {
                Some(range) => {
                    live_modifiers.insert(range);
                }
                None => pending.push(modifier.keyword.as_str().to_string()),
            }
        }

        if pending.is_empty() {
            continue;
        }
        let mut insertion = pending.join(" ");
        insertion.push(' ');
        edits.push(TextEdit::insert(offset, insertion));
    }

    let removed = snapshot
        .annotations
        .iter()
        .filter(|r| !live_annotations.contains(*r))
        .chain(snapshot.modifiers.iter().filter(|r| !live_modifiers.contains(*r)));
    let mut deletions: Vec<TextRange> = removed.map(|range| deletion_range(text, *range)).collect();
    import_edits(unit, snapshot, &mut edits, &mut deletions);

    // Widened neighbours on one line can share whitespace.
    deletions.sort_by_key(|r| (r.start(), r.end()));
    let mut merged: Vec<TextRange> = Vec::with_capacity(deletions.len());
    for range in deletions {
        match merged.last_mut() {
            Some(last) if range.start() <= last.end() => *last = last.cover(range),
            _ => merged.push(range),
        }
    }
    edits.extend(merged.into_iter().map(TextEdit::delete));
    Ok(edits)
}

/// The argument text of `(...)` following an annotation name, if any.
fn original_arguments(tail: &str) -> Option<&str> {
    let open = tail.find('(')?;
    let close = tail.rfind(')')?;
    Some(&tail[open + 1..close])
}

fn import_edits(
    unit: &CompilationUnit,
    snapshot: &SourceSnapshot,
    edits: &mut Vec<TextEdit>,
    deletions: &mut Vec<TextRange>,
) {
    let text = snapshot.text.as_str();
    let live: HashSet<TextRange> = unit.imports.iter().filter_map(|i| i.range).collect();
    let removed: Vec<TextRange> = snapshot
        .imports
        .iter()
        .copied()
        .filter(|r| !live.contains(r))
        .collect();

    let imports = &unit.imports;
    let mut replaced_first_removed = false;
    let mut i = 0;
    while i < imports.len() {
        if imports[i].range.is_some() {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < imports.len() && imports[i].range.is_none() {
            i += 1;
        }
        let rendered: Vec<String> = imports[run_start..i].iter().map(|imp| imp.render()).collect();

        let prev = imports[..run_start].iter().rev().find_map(|imp| imp.range);
        let next = imports[i..].iter().find_map(|imp| imp.range);
        // The first removed import's slot, when this run sits where it stood.
        let slot = removed.first().copied().filter(|slot| {
            !replaced_first_removed
                && prev.map_or(true, |p| p.end() <= slot.start())
                && next.map_or(true, |n| slot.end() <= n.start())
        });

        let edit = if let Some(slot) = slot {
            replaced_first_removed = true;
            let eol = line_ending(text, slot.start());
            TextEdit::new(slot, rendered.join(eol))
        } else if let Some(prev) = prev {
            let eol = line_ending(text, prev.start());
            let inserted: String = rendered.iter().map(|r| format!("{eol}{r}")).collect();
            TextEdit::insert(prev.end(), inserted)
        } else if let Some(next) = next {
            let eol = line_ending(text, next.start());
            let inserted: String = rendered.iter().map(|r| format!("{r}{eol}")).collect();
            TextEdit::insert(next.start(), inserted)
        } else if let Some(package) = unit.package.as_ref().and_then(|p| p.range) {
            let eol = line_ending(text, package.start());
            let joined = rendered.join(eol);
            TextEdit::insert(package.end(), format!("{eol}{eol}{joined}"))
        } else {
            let eol = line_ending(text, TextSize::from(0));
            let joined = rendered.join(eol);
            TextEdit::insert(TextSize::from(0), format!("{joined}{eol}{eol}"))
        };
        edits.push(edit);
    }

    let skip = usize::from(replaced_first_removed);
    for range in removed.iter().skip(skip) {
        deletions.push(deletion_range(text, *range));
    }
}

/// The line ending used by the line containing `offset`, falling back to the
/// first line ending in the file and then to `\n`.
fn line_ending(text: &str, offset: TextSize) -> &'static str {
    let rest = &text[usize::from(offset)..];
    let newline = rest
        .find('\n')
        .map(|i| usize::from(offset) + i)
        .or_else(|| text.find('\n'));
    match newline {
        Some(i) if i > 0 && text.as_bytes()[i - 1] == b'\r' => "\r\n",
        _ => "\n",
    }
}

/// Widen `range` so that deleting it leaves tidy text: a construct alone on
/// its line takes the whole line, otherwise one side's horizontal whitespace.
fn deletion_range(text: &str, range: TextRange) -> TextRange {
    let start = usize::from(range.start());
    let end = usize::from(range.end());
    let bytes = text.as_bytes();
    let is_blank = |b: u8| b == b' ' || b == b'\t';

    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    let mut after = end;
    while after < bytes.len() && is_blank(bytes[after]) {
        after += 1;
    }

    let alone_before = text[line_start..start].bytes().all(is_blank);
    let rest = &text[after..];
    if alone_before && (rest.is_empty() || rest.starts_with('\n') || rest.starts_with('\r')) {
        let newline = if rest.starts_with("\r\n") {
            2
        } else if rest.starts_with('\n') || rest.starts_with('\r') {
            1
        } else {
            0
        };
        return range_of(line_start, after + newline);
    }

    if after > end {
        return range_of(start, after);
    }

    let mut before = start;
    while before > line_start && is_blank(bytes[before - 1]) {
        before -= 1;
    }
    range_of(before, end)
}

const INDENT: &str = "    ";

pub(crate) fn render_outline(unit: &CompilationUnit) -> String {
    let mut out = String::new();
    if let Some(package) = &unit.package {
        out.push_str(&format!("package {};\n\n", package.name));
    }
    if !unit.imports.is_empty() {
        for import in &unit.imports {
            out.push_str(&import.render());
            out.push('\n');
        }
        out.push('\n');
    }
    for (idx, ty) in unit.types.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        render_type(ty, 0, &mut out);
    }
    out
}

fn render_type(ty: &TypeDecl, depth: usize, out: &mut String) {
    let indent = INDENT.repeat(depth);
    out.push_str(&indent);
    push_header(&ty.annotations, &ty.modifiers, out);
    out.push_str(&format!("{} {} {{\n", ty.kind.keyword(), ty.name));

    let member_indent = INDENT.repeat(depth + 1);
    for member in &ty.members {
        match member {
            MemberDecl::Method(method) => {
                out.push_str(&member_indent);
                push_header(&method.annotations, &method.modifiers, out);
                out.push_str(&method.signature);
                out.push_str(if method.has_body { " {}\n" } else { ";\n" });
            }
            MemberDecl::Field(field) => {
                out.push_str(&member_indent);
                push_header(&field.annotations, &field.modifiers, out);
                out.push_str(&field.signature);
                out.push_str(";\n");
            }
            MemberDecl::Initializer(init) => {
                out.push_str(&member_indent);
                out.push_str(if init.is_static { "static {}\n" } else { "{}\n" });
            }
            MemberDecl::Type(nested) => render_type(nested, depth + 1, out),
        }
    }

    out.push_str(&indent);
    out.push_str("}\n");
}

fn push_header(
    annotations: &[crate::ast::Annotation],
    modifiers: &[crate::ast::Modifier],
    out: &mut String,
) {
    for annotation in annotations {
        out.push_str(&annotation.render());
        out.push(' ');
    }
    for modifier in modifiers {
        out.push_str(modifier.keyword.as_str());
        out.push(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_takes_whole_line_when_alone() {
        let text = "class A {\n    @Test\n    void m() {}\n}\n";
        let start = text.find("@Test").unwrap();
        let range = deletion_range(text, range_of(start, start + 5));
        assert_eq!(&text[range], "    @Test\n");
    }

    #[test]
    fn deletion_takes_trailing_blanks_inline() {
        let text = "@Before public void m() {}";
        let start = text.find("public").unwrap();
        let range = deletion_range(text, range_of(start, start + 6));
        assert_eq!(&text[range], "public ");
    }

    #[test]
    fn deletion_takes_leading_blanks_before_token_without_trailing_space() {
        let text = "@Ignore @Test(x){}";
        let start = text.find("@Test").unwrap();
        let range = deletion_range(text, range_of(start, start + 8));
        assert_eq!(&text[range], " @Test(x)");
    }

    #[test]
    fn line_ending_follows_the_surrounding_line() {
        assert_eq!(line_ending("a;\r\nb;\n", TextSize::from(0)), "\r\n");
        assert_eq!(line_ending("a;\r\nb;\n", TextSize::from(4)), "\n");
        assert_eq!(line_ending("a;\r\nb;", TextSize::from(4)), "\r\n");
        assert_eq!(line_ending("a;", TextSize::from(0)), "\n");
    }

    #[test]
    fn original_arguments_are_sliced_from_parentheses() {
        assert_eq!(original_arguments("(\"x\")"), Some("\"x\""));
        assert_eq!(original_arguments(""), None);
    }
}
