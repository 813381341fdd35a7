// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The module parser.

use super::ast::*;
use super::scanner::{Scanner, Token, TokenKind};
use crate::error::Exception;
use crate::name::ModuleName;
use rustc_hash::FxHashSet;

/// Keywords that cannot start an expression in the supported subset.
const RESERVED_WORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "default", "delete",
    "do", "else", "export", "extends", "for", "function", "if", "let", "new", "return", "switch",
    "this", "throw", "try", "typeof", "var", "void", "while", "yield",
];

/// Deepest expression nesting accepted; matches serde_json's recursion limit.
const MAX_NESTING_DEPTH: usize = 128;

/// A recursive descent parser for module source.
pub struct Parser<'a> {
    module: &'a ModuleName,
    tokens: Vec<Token>,
    pos: usize,
    declared: FxHashSet<String>,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser; diagnostics are attributed to `module`.
    pub fn new(module: &'a ModuleName, source: &str) -> Self {
        Self {
            module,
            tokens: Scanner::new(source).tokenize(),
            pos: 0,
            declared: FxHashSet::default(),
            depth: 0,
        }
    }

    /// Parses the source code into a module unit.
    pub fn parse_module(mut self) -> Result<ModuleUnit, Exception> {
        let mut unit = ModuleUnit::default();

        while !self.is_at_end() {
            if self.check(&TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            if self.current().is_word("import") && !matches!(self.peek_kind(1), TokenKind::Dot) {
                let import = self.parse_import()?;
                for binding in &import.bindings {
                    self.declare(binding.local())?;
                }
                unit.imports.push(import);
            } else {
                let statement = self.parse_statement()?;
                for name in exported_names(&statement.kind) {
                    if unit.exports(&name) {
                        return Err(self.error_at(
                            statement.line,
                            format!("Duplicate export of '{}'", name),
                        ));
                    }
                    unit.export_names.push(name);
                }
                unit.body.push(statement);
            }
        }

        for statement in &unit.body {
            if let StatementKind::ExportNamed(list) = &statement.kind {
                let undeclared = list.iter().find(|(local, _)| !self.declared.contains(local));
                if let Some((local, _)) = undeclared {
                    return Err(self.error_at(
                        statement.line,
                        format!("Export '{}' is not defined in module", local),
                    ));
                }
            }
        }

        Ok(unit)
    }

    fn parse_import(&mut self) -> Result<ImportDeclaration, Exception> {
        let line = self.line();
        self.advance(); // consume 'import'

        // import 'module'
        if let TokenKind::String(specifier) = self.current().clone() {
            self.advance();
            self.consume_semicolon();
            return Ok(ImportDeclaration {
                specifier,
                bindings: Vec::new(),
                line,
            });
        }

        let mut bindings = Vec::new();
        if let TokenKind::Identifier(local) = self.current().clone() {
            self.advance();
            bindings.push(ImportBinding::Default(local));
            if !self.matches(&TokenKind::Comma) {
                return self.finish_import(bindings, line);
            }
        }

        if self.matches(&TokenKind::Star) {
            self.expect_word("as")?;
            let local = self.expect_identifier()?;
            bindings.push(ImportBinding::Namespace(local));
        } else if self.matches(&TokenKind::LeftBrace) {
            for (imported, local) in self.parse_specifier_list()? {
                bindings.push(ImportBinding::Named { imported, local });
            }
        } else {
            return Err(self.unexpected());
        }

        self.finish_import(bindings, line)
    }

    fn finish_import(
        &mut self,
        bindings: Vec<ImportBinding>,
        line: usize,
    ) -> Result<ImportDeclaration, Exception> {
        self.expect_word("from")?;
        let specifier = match self.current().clone() {
            TokenKind::String(s) => {
                self.advance();
                s
            }
            _ => return Err(self.unexpected()),
        };
        self.consume_semicolon();
        Ok(ImportDeclaration {
            specifier,
            bindings,
            line,
        })
    }

    /// Parses `a, b as c }` after the opening brace.
    fn parse_specifier_list(&mut self) -> Result<Vec<(String, String)>, Exception> {
        let mut list = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            let name = match self.current().clone() {
                TokenKind::Identifier(name) | TokenKind::String(name) => {
                    self.advance();
                    name
                }
                _ => return Err(self.unexpected()),
            };
            let alias = if self.current().is_word("as") {
                self.advance();
                self.expect_name()?
            } else {
                name.clone()
            };
            list.push((name, alias));
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(list)
    }

    /// Parses a single statement.
    fn parse_statement(&mut self) -> Result<Statement, Exception> {
        let line = self.line();
        let kind = if self.current().is_word("export") {
            self.advance();
            self.parse_export()?
        } else if self.current().is_word("const") {
            self.parse_const(false)?
        } else if self.current().is_word("throw") {
            self.advance();
            StatementKind::Throw(self.parse_expression()?)
        } else {
            StatementKind::Expression(self.parse_expression()?)
        };
        self.consume_semicolon();
        Ok(Statement { kind, line })
    }

    fn parse_export(&mut self) -> Result<StatementKind, Exception> {
        if self.current().is_word("default") {
            self.advance();
            return Ok(StatementKind::ExportDefault(self.parse_expression()?));
        }
        if self.current().is_word("const") {
            return self.parse_const(true);
        }
        if self.matches(&TokenKind::LeftBrace) {
            let list = self.parse_specifier_list()?;
            if self.current().is_word("from") {
                return Err(self.error("re-exports ('export ... from') are not supported"));
            }
            return Ok(StatementKind::ExportNamed(list));
        }
        Err(self.unexpected())
    }

    fn parse_const(&mut self, exported: bool) -> Result<StatementKind, Exception> {
        self.advance(); // consume 'const'
        let name = self.expect_identifier()?;
        self.declare(&name)?;
        self.expect(&TokenKind::Equal)?;
        let init = self.parse_expression()?;
        Ok(StatementKind::Const {
            name,
            init,
            exported,
        })
    }

    /// Parses an expression, bounding how deeply expressions may nest.
    fn parse_expression(&mut self) -> Result<Expression, Exception> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error("maximum nesting depth exceeded"));
        }
        self.depth += 1;
        let expr = self.parse_chain();
        self.depth -= 1;
        expr
    }

    /// A primary followed by member accesses and calls.
    fn parse_chain(&mut self) -> Result<Expression, Exception> {
        if self.current().is_word("new") {
            self.advance();
        }
        let mut expr = self.parse_primary()?;
        loop {
            if self.matches(&TokenKind::Dot) {
                let property = self.expect_name()?;
                expr = Expression::Member(Box::new(expr), property);
            } else if self.matches(&TokenKind::LeftParen) {
                let args = self.parse_list(&TokenKind::RightParen, Self::parse_expression)?;
                expr = Expression::Call(Box::new(expr), args);
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, Exception> {
        let token = self.current().clone();
        self.advance();
        match token {
            TokenKind::String(s) => Ok(Expression::String(s)),
            TokenKind::Number(n) => Ok(Expression::Number(n)),
            TokenKind::Minus => match self.current().clone() {
                TokenKind::Number(n) => {
                    self.advance();
                    Ok(Expression::Number(-n))
                }
                _ => Err(self.unexpected()),
            },
            TokenKind::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::LeftBracket => Ok(Expression::Array(
                self.parse_list(&TokenKind::RightBracket, Self::parse_expression)?,
            )),
            TokenKind::LeftBrace => Ok(Expression::Object(
                self.parse_list(&TokenKind::RightBrace, Self::parse_property)?,
            )),
            TokenKind::Identifier(word) => match word.as_str() {
                "true" => Ok(Expression::Boolean(true)),
                "false" => Ok(Expression::Boolean(false)),
                "null" => Ok(Expression::Null),
                "undefined" => Ok(Expression::Undefined),
                "import" => {
                    self.expect(&TokenKind::Dot)?;
                    self.expect_word("meta")?;
                    Ok(Expression::ImportMeta)
                }
                _ if RESERVED_WORDS.contains(&word.as_str()) => {
                    self.pos -= 1;
                    Err(self.unexpected())
                }
                _ => Ok(Expression::Identifier(word)),
            },
            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }

    fn parse_property(&mut self) -> Result<(String, Expression), Exception> {
        let key = match self.current().clone() {
            TokenKind::Identifier(key) | TokenKind::String(key) => key,
            TokenKind::Number(n) => crate::value::Value::Number(n).to_string(),
            _ => return Err(self.unexpected()),
        };
        let shorthand = matches!(self.current(), TokenKind::Identifier(_));
        self.advance();
        if shorthand && !self.check(&TokenKind::Colon) {
            if RESERVED_WORDS.contains(&key.as_str()) {
                self.pos -= 1;
                return Err(self.unexpected());
            }
            return Ok((key.clone(), Expression::Identifier(key)));
        }
        self.expect(&TokenKind::Colon)?;
        Ok((key, self.parse_expression()?))
    }

    /// Parses comma separated items up to and including `close`.
    /// A trailing comma is accepted.
    fn parse_list<T>(
        &mut self,
        close: &TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T, Exception>,
    ) -> Result<Vec<T>, Exception> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(item(self)?);
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    fn declare(&mut self, name: &str) -> Result<(), Exception> {
        if !self.declared.insert(name.to_string()) {
            return Err(self.error(format!("Identifier '{}' has already been declared", name)));
        }
        Ok(())
    }

    // Token helpers

    fn current(&self) -> &TokenKind {
        self.peek_kind(0)
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + offset)
            .or_else(|| self.tokens.last())
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current(), TokenKind::Eof)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.current() == kind
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), Exception> {
        if self.matches(kind) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<(), Exception> {
        if self.current().is_word(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_identifier(&mut self) -> Result<String, Exception> {
        match self.current().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Identifier or string, as allowed in specifier lists and after `.`.
    fn expect_name(&mut self) -> Result<String, Exception> {
        match self.current().clone() {
            TokenKind::Identifier(name) | TokenKind::String(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Statements may end with `;`; a missing one is tolerated.
    fn consume_semicolon(&mut self) {
        self.matches(&TokenKind::Semicolon);
    }

    fn unexpected(&self) -> Exception {
        let message = match self.current() {
            TokenKind::Invalid(reason) => reason.clone(),
            TokenKind::Eof => "unexpected end of input".to_string(),
            other => format!("unexpected token {}", describe(other)),
        };
        self.error(message)
    }

    fn error(&self, message: impl AsRef<str>) -> Exception {
        self.error_at(self.line(), message)
    }

    fn error_at(&self, line: usize, message: impl AsRef<str>) -> Exception {
        let frame = format!("{}:{}", self.module, line);
        Exception::syntax_error(format!("{}: {}", frame, message.as_ref())).with_frame(frame)
    }
}

fn exported_names(kind: &StatementKind) -> Vec<String> {
    match kind {
        StatementKind::Const {
            name,
            exported: true,
            ..
        } => vec![name.clone()],
        StatementKind::ExportDefault(_) => vec!["default".to_string()],
        StatementKind::ExportNamed(list) => {
            list.iter().map(|(_, exported)| exported.clone()).collect()
        }
        _ => Vec::new(),
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Identifier(name) => format!("'{}'", name),
        TokenKind::String(s) => format!("string \"{}\"", s),
        TokenKind::Number(n) => format!("number {}", n),
        TokenKind::LeftBrace => "'{'".to_string(),
        TokenKind::RightBrace => "'}'".to_string(),
        TokenKind::LeftParen => "'('".to_string(),
        TokenKind::RightParen => "')'".to_string(),
        TokenKind::LeftBracket => "'['".to_string(),
        TokenKind::RightBracket => "']'".to_string(),
        TokenKind::Comma => "','".to_string(),
        TokenKind::Semicolon => "';'".to_string(),
        TokenKind::Colon => "':'".to_string(),
        TokenKind::Dot => "'.'".to_string(),
        TokenKind::Star => "'*'".to_string(),
        TokenKind::Equal => "'='".to_string(),
        TokenKind::Minus => "'-'".to_string(),
        TokenKind::Invalid(reason) => reason.clone(),
        TokenKind::Eof => "end of input".to_string(),
    }
}
