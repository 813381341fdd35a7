// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module compiler.
//!
//! Compiles the declarative subset of ECMAScript module syntax the engine
//! understands:
//!
//! - every static `import` form (default, named, namespace, side-effect)
//! - `export default <expr>`, `export const x = <expr>`, `export { a as b }`
//! - `const x = <expr>` and `throw <expr>`
//! - expression statements
//!
//! Expressions are literals, identifiers, `import.meta`, member access and
//! calls. Compilation never executes anything.

pub mod ast;
mod parser;
mod scanner;

pub use ast::{Expression, ImportBinding, ImportDeclaration, ModuleUnit, Statement, StatementKind};
pub use parser::Parser;
pub use scanner::{Scanner, Token, TokenKind};

use crate::error::Exception;
use crate::name::ModuleName;

/// Compiles module source, attributing diagnostics to `name`.
pub fn compile(name: &ModuleName, source: &str) -> Result<ModuleUnit, Exception> {
    Parser::new(name, source).parse_module()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(source: &str) -> ModuleUnit {
        compile(&ModuleName::from("test.js"), source).unwrap()
    }

    fn syntax_error(source: &str) -> String {
        compile(&ModuleName::from("test.js"), source)
            .unwrap_err()
            .message()
    }

    #[test]
    fn test_parse_imports() {
        let unit = unit(
            r#"
            import foo from 'foo';
            import { bar, baz as qux } from "bar";
            import * as all from 'all';
            import 'side-effect';
            import def, { named } from 'mixed';
        "#,
        );

        let specifiers: Vec<_> = unit.imports.iter().map(|i| i.specifier.as_str()).collect();
        assert_eq!(specifiers, ["foo", "bar", "all", "side-effect", "mixed"]);
        assert_eq!(unit.imports[0].bindings, [ImportBinding::Default("foo".into())]);
        assert_eq!(
            unit.imports[1].bindings[1],
            ImportBinding::Named {
                imported: "baz".into(),
                local: "qux".into()
            }
        );
        assert_eq!(unit.imports[2].bindings, [ImportBinding::Namespace("all".into())]);
        assert!(unit.imports[3].bindings.is_empty());
        assert_eq!(unit.imports[4].bindings.len(), 2);
        assert_eq!(unit.imports[4].line, 6);
    }

    #[test]
    fn test_parse_exports() {
        let unit = unit(
            r#"
            const local = { a: 1, "b": [1, 2,], };
            export const version = "1.0";
            export { local as config };
            export default import.meta.url;
        "#,
        );

        assert_eq!(unit.export_names, ["version", "config", "default"]);
        assert_eq!(unit.body.len(), 4);
        assert_eq!(
            unit.body[3].kind,
            StatementKind::ExportDefault(Expression::Member(
                Box::new(Expression::ImportMeta),
                "url".into()
            ))
        );
    }

    #[test]
    fn test_shorthand_properties() {
        let unit = unit("const a = 1; export default { a, b: a };");
        assert_eq!(
            unit.body[1].kind,
            StatementKind::ExportDefault(Expression::Object(vec![
                ("a".into(), Expression::Identifier("a".into())),
                ("b".into(), Expression::Identifier("a".into())),
            ]))
        );
        assert!(syntax_error("export default { new };").contains("unexpected token"));
    }

    #[test]
    fn test_calls_and_new() {
        let unit = unit("throw new Error('boom', -1);");
        assert_eq!(
            unit.body[0].kind,
            StatementKind::Throw(Expression::Call(
                Box::new(Expression::Identifier("Error".into())),
                vec![Expression::String("boom".into()), Expression::Number(-1.0)]
            ))
        );
    }

    #[test]
    fn test_syntax_errors_name_module_and_line() {
        let message = syntax_error("const a = 1;\nconst b = ;");
        assert_eq!(message, "SyntaxError: test.js:2: unexpected token ';'");
    }

    #[test]
    fn test_duplicate_declarations_rejected() {
        assert!(syntax_error("import a from 'x'; const a = 1;").contains("already been declared"));
        assert!(syntax_error("export default 1; export default 2;").contains("Duplicate export"));
        assert!(syntax_error("export { missing };").contains("not defined"));
    }

    #[test]
    fn test_unsupported_syntax_rejected() {
        assert!(syntax_error("function f() {}").contains("unexpected token"));
        assert!(syntax_error("export { a } from 'b';").starts_with("SyntaxError"));
        assert!(syntax_error("let x = 1 + 2;").starts_with("SyntaxError"));
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let deep = format!("export default {}{};", "[".repeat(3000), "]".repeat(3000));
        let message = syntax_error(&deep);
        assert!(message.starts_with("SyntaxError: test.js:1: "), "{}", message);
        assert!(message.contains("maximum nesting depth exceeded"), "{}", message);

        let deep_parens = format!("export default {}1{};", "(".repeat(3000), ")".repeat(3000));
        assert!(syntax_error(&deep_parens).contains("maximum nesting depth exceeded"));

        let nested = format!("export default {}{};", "[".repeat(100), "]".repeat(100));
        assert_eq!(unit(&nested).body.len(), 1);
    }
}
