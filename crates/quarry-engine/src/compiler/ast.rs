// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Compiled module representation.

/// A compiled module: its import requests, statements and export names.
#[derive(Debug, Clone, Default)]
pub struct ModuleUnit {
    /// Import declarations in source order
    pub imports: Vec<ImportDeclaration>,
    /// Top-level statements in source order
    pub body: Vec<Statement>,
    /// Names of every export binding
    pub export_names: Vec<String>,
}

impl ModuleUnit {
    /// Returns true if the module exports `name`.
    pub fn exports(&self, name: &str) -> bool {
        self.export_names.iter().any(|n| n == name)
    }
}

/// Parsed import statement
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    /// The module specifier (e.g., './foo.js', 'quarry:process')
    pub specifier: String,
    /// Bindings introduced into module scope
    pub bindings: Vec<ImportBinding>,
    /// Source line of the declaration
    pub line: usize,
}

/// Import binding types
#[derive(Debug, Clone, PartialEq)]
pub enum ImportBinding {
    /// `import foo from 'module'`
    Default(String),
    /// `import { foo }` or `import { foo as bar }`
    Named {
        /// Export name in the requested module
        imported: String,
        /// Local binding name
        local: String,
    },
    /// `import * as foo from 'module'`
    Namespace(String),
}

impl ImportBinding {
    /// The local binding name.
    pub fn local(&self) -> &str {
        match self {
            ImportBinding::Default(local)
            | ImportBinding::Named { local, .. }
            | ImportBinding::Namespace(local) => local,
        }
    }
}

/// A top-level statement with its source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// What the statement does
    pub kind: StatementKind,
    /// Source line where the statement starts
    pub line: usize,
}

/// Statement types
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// `const name = init` (exported with `export const`)
    Const {
        /// Binding name
        name: String,
        /// Initializer
        init: Expression,
        /// Whether the binding is exported under its own name
        exported: bool,
    },
    /// `export default expr`
    ExportDefault(Expression),
    /// `export { local as exported, ... }`
    ExportNamed(Vec<(String, String)>),
    /// `throw expr`
    Throw(Expression),
    /// Expression evaluated for its side effects
    Expression(Expression),
}

/// Expression types
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// `[a, b]`
    Array(Vec<Expression>),
    /// `{ key: value }`
    Object(Vec<(String, Expression)>),
    /// Binding or global reference
    Identifier(String),
    /// `import.meta`
    ImportMeta,
    /// `object.property`
    Member(Box<Expression>, String),
    /// `callee(args)` and `new callee(args)`
    Call(Box<Expression>, Vec<Expression>),
}
