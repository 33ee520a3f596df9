//! Structural Java parser.
//!
//! Understands package, import and type declarations, member headers
//! (annotations, modifiers, signatures) and skips bodies by balanced
//! delimiter matching. Unlike an IDE parser it does not recover: the first
//! malformed construct aborts with a [`ParseError`].

use std::collections::HashSet;

use jrewrite_core::{LineIndex, TextRange, TextSize};

use crate::ast::{
    Annotation, CompilationUnit, FieldDecl, ImportDecl, InitializerDecl, MemberDecl, MethodDecl,
    Modifier, ModifierKeyword, PackageDecl, TypeDecl, TypeKind, UnmodelledAnnotation,
};
use crate::lexer::{lex, Token, TokenKind};
use crate::ParseError;

pub(crate) fn parse_compilation_unit(text: &str) -> Result<CompilationUnit, ParseError> {
    let tokens = lex(text)?;
    let mut parser = Parser {
        text,
        tokens,
        pos: 0,
    };
    let unit = parser.compilation_unit()?;
    let unmodelled = parser.unmodelled_annotations(&unit);
    Ok(unit.with_unmodelled_annotations(unmodelled).with_source(text))
}

/// Annotations and modifiers in front of a declaration.
#[derive(Default)]
struct Header {
    annotations: Vec<Annotation>,
    modifiers: Vec<Modifier>,
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_n(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).copied()
    }

    fn text_of(&self, token: Token) -> &'a str {
        token.text(self.text)
    }

    fn at_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek()
            .is_some_and(|t| t.kind == TokenKind::Ident && self.text_of(t) == keyword)
    }

    fn nth_is_keyword(&self, n: usize, keyword: &str) -> bool {
        self.peek_n(n)
            .is_some_and(|t| t.kind == TokenKind::Ident && self.text_of(t) == keyword)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    fn eof_error(&self) -> ParseError {
        let end = TextSize::from(self.text.len() as u32);
        ParseError::new("unexpected end of input", TextRange::empty(end))
    }

    fn expect_kind(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        match self.peek() {
            Some(tok) if tok.kind == kind => {
                self.pos += 1;
                Ok(tok)
            }
            Some(tok) => Err(ParseError::new(
                format!("expected {what}, found `{}`", self.text_of(tok)),
                tok.range,
            )),
            None => Err(self.eof_error()),
        }
    }

    fn expect_ident(&mut self) -> Result<Token, ParseError> {
        self.expect_kind(TokenKind::Ident, "an identifier")
    }

    fn compilation_unit(&mut self) -> Result<CompilationUnit, ParseError> {
        let package = if self.at_keyword("package") {
            Some(self.package_decl()?)
        } else {
            None
        };

        let mut imports = Vec::new();
        loop {
            if self.at_kind(TokenKind::Semi) {
                self.bump();
            } else if self.at_keyword("import") {
                imports.push(self.import_decl()?);
            } else {
                break;
            }
        }

        let mut types = Vec::new();
        while !self.is_eof() {
            if self.at_kind(TokenKind::Semi) {
                self.bump();
                continue;
            }
            let header = self.header()?;
            if self.at_keyword("module") || self.at_keyword("open") {
                let tok = self.peek().ok_or_else(|| self.eof_error())?;
                return Err(ParseError::new(
                    "module declarations are not supported",
                    tok.range,
                ));
            }
            types.push(self.type_decl(header)?);
        }

        Ok(CompilationUnit::new(package, imports, types))
    }

    fn package_decl(&mut self) -> Result<PackageDecl, ParseError> {
        let kw = self.expect_ident()?;
        let (name, _) = self.qualified_name()?;
        let semi = self.expect_kind(TokenKind::Semi, "`;`")?;
        Ok(PackageDecl {
            name,
            range: Some(TextRange::new(kw.range.start(), semi.range.end())),
        })
    }

    fn import_decl(&mut self) -> Result<ImportDecl, ParseError> {
        let kw = self.expect_ident()?;
        let is_static = if self.at_keyword("static") {
            self.bump();
            true
        } else {
            false
        };

        let first = self.expect_ident()?;
        let mut parts = vec![self.text_of(first).to_string()];
        let mut is_wildcard = false;
        while self.at_kind(TokenKind::Dot) {
            self.bump();
            if self.at_kind(TokenKind::Star) {
                self.bump();
                is_wildcard = true;
                break;
            }
            let part = self.expect_ident()?;
            parts.push(self.text_of(part).to_string());
        }

        let semi = self.expect_kind(TokenKind::Semi, "`;`")?;
        Ok(ImportDecl {
            path: parts.join("."),
            is_static,
            is_wildcard,
            range: Some(TextRange::new(kw.range.start(), semi.range.end())),
        })
    }

    fn qualified_name(&mut self) -> Result<(String, TextRange), ParseError> {
        let first = self.expect_ident()?;
        let mut range = first.range;
        let mut parts = vec![self.text_of(first).to_string()];

        while self.at_kind(TokenKind::Dot)
            && self.peek_n(1).is_some_and(|t| t.kind == TokenKind::Ident)
        {
            self.bump();
            let part = self.expect_ident()?;
            range = range.cover(part.range);
            parts.push(self.text_of(part).to_string());
        }

        Ok((parts.join("."), range))
    }

    fn at_annotation_type_decl(&self) -> bool {
        self.at_kind(TokenKind::At) && self.nth_is_keyword(1, "interface")
    }

    fn header(&mut self) -> Result<Header, ParseError> {
        let mut header = Header::default();
        loop {
            if self.at_kind(TokenKind::At) && !self.at_annotation_type_decl() {
                header.annotations.push(self.annotation()?);
                continue;
            }

            let Some(tok) = self.peek() else { break };
            if tok.kind != TokenKind::Ident {
                break;
            }

            let text = self.text_of(tok);
            if text == "non"
                && self.peek_n(1).is_some_and(|t| t.kind == TokenKind::Minus)
                && self.nth_is_keyword(2, "sealed")
            {
                self.pos += 3;
                let end = self.tokens[self.pos - 1].range;
                header.modifiers.push(Modifier {
                    keyword: ModifierKeyword::NonSealed,
                    range: Some(tok.range.cover(end)),
                });
                continue;
            }

            let Some(keyword) = ModifierKeyword::from_keyword(text) else {
                break;
            };
            // `sealed` is contextual and may name a field.
            if keyword == ModifierKeyword::Sealed
                && !self.peek_n(1).is_some_and(|t| t.kind == TokenKind::Ident || t.kind == TokenKind::At)
            {
                break;
            }
            self.bump();
            header.modifiers.push(Modifier {
                keyword,
                range: Some(tok.range),
            });
        }
        Ok(header)
    }

    fn annotation(&mut self) -> Result<Annotation, ParseError> {
        let at = self.expect_kind(TokenKind::At, "`@`")?;
        let (name, name_range) = self.qualified_name()?;
        let mut range = at.range.cover(name_range);

        let arguments = if self.at_kind(TokenKind::LParen) {
            let lparen = self.bump().ok_or_else(|| self.eof_error())?;
            let rparen = self.skip_until_close(lparen, TokenKind::LParen, TokenKind::RParen)?;
            range = range.cover(rparen.range);
            let inner = TextRange::new(lparen.range.end(), rparen.range.start());
            Some(self.text[inner].to_string())
        } else {
            None
        };

        Ok(Annotation {
            name,
            arguments,
            range: Some(range),
            name_range: Some(name_range),
        })
    }

    /// Skip tokens up to and including the `close` matching an already consumed `open`.
    fn skip_until_close(
        &mut self,
        opener: Token,
        open: TokenKind,
        close: TokenKind,
    ) -> Result<Token, ParseError> {
        let mut depth = 1usize;
        while let Some(tok) = self.bump() {
            if tok.kind == open {
                depth += 1;
            } else if tok.kind == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(tok);
                }
            }
        }
        Err(ParseError::new(
            format!("unbalanced `{}`", self.text_of(opener)),
            opener.range,
        ))
    }

    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> Result<Token, ParseError> {
        let opener = self.expect_kind(open, "an opening delimiter")?;
        self.skip_until_close(opener, open, close)
    }

    fn type_decl(&mut self, header: Header) -> Result<TypeDecl, ParseError> {
        let keyword = self.peek().ok_or_else(|| self.eof_error())?;
        let kind = if self.at_annotation_type_decl() {
            self.pos += 2;
            TypeKind::Annotation
        } else {
            let kind = match self.text_of(keyword) {
                "class" if keyword.kind == TokenKind::Ident => TypeKind::Class,
                "interface" if keyword.kind == TokenKind::Ident => TypeKind::Interface,
                "enum" if keyword.kind == TokenKind::Ident => TypeKind::Enum,
                "record" if keyword.kind == TokenKind::Ident => TypeKind::Record,
                other => {
                    return Err(ParseError::new(
                        format!("expected a type declaration, found `{other}`"),
                        keyword.range,
                    ))
                }
            };
            self.bump();
            kind
        };

        let name_tok = self.expect_ident()?;
        let name = self.text_of(name_tok).to_string();

        // Type parameters, record components, `extends`, `implements`, `permits`.
        while !self.at_kind(TokenKind::LBrace) {
            match self.peek() {
                None => return Err(self.eof_error()),
                Some(tok) if tok.kind == TokenKind::LParen => {
                    self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        self.expect_kind(TokenKind::LBrace, "`{`")?;

        if kind == TypeKind::Enum {
            self.skip_enum_constants()?;
        }

        let mut members = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.eof_error()),
                Some(tok) if tok.kind == TokenKind::RBrace => {
                    self.bump();
                    break;
                }
                Some(tok) if tok.kind == TokenKind::Semi => {
                    self.bump();
                }
                Some(_) => members.push(self.member_decl(&name)?),
            }
        }

        Ok(TypeDecl {
            kind,
            name,
            annotations: header.annotations,
            modifiers: header.modifiers,
            members,
            signature_start: Some(keyword.range.start()),
        })
    }

    fn skip_enum_constants(&mut self) -> Result<(), ParseError> {
        loop {
            if self.at_kind(TokenKind::Semi) {
                self.bump();
                return Ok(());
            }
            if self.at_kind(TokenKind::RBrace) {
                return Ok(());
            }

            // Constant annotations are not modelled; they are picked up as
            // unmodelled annotations after parsing.
            let _ = self.header()?;
            self.expect_ident()?;
            if self.at_kind(TokenKind::LParen) {
                self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
            }
            if self.at_kind(TokenKind::LBrace) {
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
            }

            match self.peek() {
                Some(tok) if tok.kind == TokenKind::Comma => {
                    self.bump();
                }
                Some(tok) if matches!(tok.kind, TokenKind::Semi | TokenKind::RBrace) => {}
                Some(tok) => {
                    return Err(ParseError::new(
                        format!("expected `,` or `;` after enum constant, found `{}`", self.text_of(tok)),
                        tok.range,
                    ))
                }
                None => return Err(self.eof_error()),
            }
        }
    }

    fn at_nested_type(&self) -> bool {
        if self.at_annotation_type_decl() {
            return true;
        }
        let Some(tok) = self.peek() else { return false };
        if tok.kind != TokenKind::Ident {
            return false;
        }
        match self.text_of(tok) {
            "class" | "interface" | "enum" => true,
            // `record` is contextual: `record Foo(` declares a type, `Record foo;` does not.
            "record" => {
                self.peek_n(1).is_some_and(|t| t.kind == TokenKind::Ident)
                    && self
                        .peek_n(2)
                        .is_some_and(|t| matches!(t.kind, TokenKind::LParen | TokenKind::Lt))
            }
            _ => false,
        }
    }

    fn member_decl(&mut self, enclosing_type: &str) -> Result<MemberDecl, ParseError> {
        let header = self.header()?;

        if self.at_kind(TokenKind::LBrace) {
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
            let is_static = header
                .modifiers
                .iter()
                .any(|m| m.keyword == ModifierKeyword::Static);
            return Ok(MemberDecl::Initializer(InitializerDecl { is_static }));
        }

        if self.at_nested_type() {
            return Ok(MemberDecl::Type(self.type_decl(header)?));
        }

        let signature_start = self.peek().ok_or_else(|| self.eof_error())?;

        if self.at_kind(TokenKind::Lt) {
            self.skip_balanced(TokenKind::Lt, TokenKind::Gt)?;
        }

        // Constructors, including compact record constructors.
        let at_constructor = self.peek().is_some_and(|t| {
            t.kind == TokenKind::Ident && self.text_of(t) == enclosing_type
        }) && self
            .peek_n(1)
            .is_some_and(|t| matches!(t.kind, TokenKind::LParen | TokenKind::LBrace));
        if at_constructor {
            let name_tok = self.expect_ident()?;
            let name = self.text_of(name_tok).to_string();
            let signature_end = if self.at_kind(TokenKind::LParen) {
                let params_end = self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
                self.skip_throws_clause(params_end)?
            } else {
                self.tokens[self.pos - 1]
            };
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
            return Ok(MemberDecl::Method(MethodDecl {
                name,
                is_constructor: true,
                annotations: header.annotations,
                modifiers: header.modifiers,
                signature: self.signature_text(signature_start, signature_end),
                has_body: true,
                signature_start: Some(signature_start.range.start()),
            }));
        }

        self.type_ref()?;
        let name_tok = self.expect_ident()?;
        let name = self.text_of(name_tok).to_string();

        if self.at_kind(TokenKind::LParen) {
            let mut signature_end = self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
            // Legacy array return syntax: `int foo()[]`.
            while self.at_kind(TokenKind::LBracket) {
                signature_end = self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket)?;
            }
            signature_end = self.skip_throws_clause(signature_end)?;

            let has_body = if self.at_keyword("default") {
                // Annotation element default value.
                self.skip_to_semi()?;
                false
            } else if self.at_kind(TokenKind::Semi) {
                self.bump();
                false
            } else {
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                true
            };

            return Ok(MemberDecl::Method(MethodDecl {
                name,
                is_constructor: false,
                annotations: header.annotations,
                modifiers: header.modifiers,
                signature: self.signature_text(signature_start, signature_end),
                has_body,
                signature_start: Some(signature_start.range.start()),
            }));
        }

        self.skip_to_semi()?;
        // The token before the `;` just consumed.
        let signature_end = self.tokens[self.pos - 2];
        Ok(MemberDecl::Field(FieldDecl {
            name,
            annotations: header.annotations,
            modifiers: header.modifiers,
            signature: self.signature_text(signature_start, signature_end),
            signature_start: Some(signature_start.range.start()),
        }))
    }

    fn type_ref(&mut self) -> Result<(), ParseError> {
        self.qualified_name()?;
        if self.at_kind(TokenKind::Lt) {
            self.skip_balanced(TokenKind::Lt, TokenKind::Gt)?;
            // `Outer<T>.Inner`
            while self.at_kind(TokenKind::Dot) {
                self.bump();
                self.type_ref()?;
            }
        }
        while self.at_kind(TokenKind::LBracket) {
            self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket)?;
        }
        if self.at_kind(TokenKind::Dot)
            && self.peek_n(1).is_some_and(|t| t.kind == TokenKind::Dot)
            && self.peek_n(2).is_some_and(|t| t.kind == TokenKind::Dot)
        {
            self.pos += 3;
        }
        Ok(())
    }

    /// Returns the last token of the clause, or `last` when there is none.
    fn skip_throws_clause(&mut self, last: Token) -> Result<Token, ParseError> {
        if !self.at_keyword("throws") {
            return Ok(last);
        }
        let mut last = self.bump().ok_or_else(|| self.eof_error())?;
        while !self.at_kind(TokenKind::LBrace) && !self.at_kind(TokenKind::Semi) {
            last = self.bump().ok_or_else(|| self.eof_error())?;
        }
        Ok(last)
    }

    /// Skip to the `;` ending a field or element declaration, stepping over
    /// initializers such as array literals and anonymous class bodies.
    fn skip_to_semi(&mut self) -> Result<Token, ParseError> {
        loop {
            let tok = self.peek().ok_or_else(|| self.eof_error())?;
            match tok.kind {
                TokenKind::Semi => {
                    self.bump();
                    return Ok(tok);
                }
                TokenKind::LParen => {
                    self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
                }
                TokenKind::LBrace => {
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                }
                TokenKind::LBracket => {
                    self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket)?;
                }
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    return Err(ParseError::new(
                        format!("unexpected `{}`", self.text_of(tok)),
                        tok.range,
                    ));
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Every `@Name` or `@a.b.Name` in the token stream that did not become
    /// part of a declaration header.
    fn unmodelled_annotations(&self, unit: &CompilationUnit) -> Vec<UnmodelledAnnotation> {
        let modelled: HashSet<TextSize> = unit
            .declarations()
            .iter()
            .flat_map(|decl| decl.annotations.iter().filter_map(|a| a.range))
            .map(|range| range.start())
            .collect();
        let index = LineIndex::new(self.text);
        let tokens = &self.tokens;

        let mut out = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let at = tokens[i];
            i += 1;
            if at.kind != TokenKind::At || modelled.contains(&at.range.start()) {
                continue;
            }
            let Some(first) = tokens.get(i).copied().filter(|t| t.kind == TokenKind::Ident) else {
                continue;
            };
            if self.text_of(first) == "interface" {
                continue;
            }
            i += 1;
            let mut parts = vec![self.text_of(first)];
            let mut end = first.range.end();
            while i + 1 < tokens.len()
                && tokens[i].kind == TokenKind::Dot
                && tokens[i + 1].kind == TokenKind::Ident
            {
                parts.push(self.text_of(tokens[i + 1]));
                end = tokens[i + 1].range.end();
                i += 2;
            }
            out.push(UnmodelledAnnotation {
                name: parts.join("."),
                position: index.line_col(at.range.start()),
                range: TextRange::new(at.range.start(), end),
            });
        }
        out
    }

    fn signature_text(&self, first: Token, last: Token) -> String {
        let range = TextRange::new(first.range.start(), last.range.end());
        self.text[range].split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
