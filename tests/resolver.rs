#[cfg(test)]
mod resolver_tests {
    use treelox as lox;

    use lox::ast::*;
    use lox::diagnostics::Diagnostics;
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;

    struct Resolved {
        statements: Vec<Stmt>,
        interpreter: Interpreter,
        errors: Vec<String>,
    }

    fn resolve(source: &str) -> Resolved {
        let mut diagnostics = Diagnostics::new();
        let mut scanner = Scanner::new();
        scanner.scan_source(source, &mut diagnostics);

        let statements = Parser::new(scanner.tokens(), &mut diagnostics).parse();
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.errors());

        let mut interpreter = Interpreter::capturing();
        Resolver::new(&mut interpreter, &mut diagnostics).resolve(&statements);

        let errors = diagnostics
            .semantic_errors()
            .iter()
            .map(|e| e.to_string())
            .collect();

        Resolved {
            statements,
            interpreter,
            errors,
        }
    }

    fn assert_single_error(source: &str, expected: &str) {
        let resolved = resolve(source);
        assert_eq!(resolved.errors, [expected]);
    }

    /// Every `Variable` node named `name`, in source order.
    fn variable_ids(statements: &[Stmt], name: &str) -> Vec<ExprId> {
        fn walk_stmt(stmt: &Stmt, name: &str, out: &mut Vec<ExprId>) {
            match stmt {
                Stmt::Expression(e) | Stmt::Print(e) => walk_expr(e, name, out),
                Stmt::Var { initializer, .. } => {
                    if let Some(e) = initializer {
                        walk_expr(e, name, out);
                    }
                }
                Stmt::Block(body) => body.iter().for_each(|s| walk_stmt(s, name, out)),
                Stmt::Function(f) => f.body.iter().for_each(|s| walk_stmt(s, name, out)),
                Stmt::Return { value, .. } => {
                    if let Some(e) = value {
                        walk_expr(e, name, out);
                    }
                }
                Stmt::If {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    walk_expr(condition, name, out);
                    walk_stmt(then_branch, name, out);
                    if let Some(s) = else_branch {
                        walk_stmt(s, name, out);
                    }
                }
                Stmt::While { condition, body } => {
                    walk_expr(condition, name, out);
                    walk_stmt(body, name, out);
                }
                Stmt::Class { methods, .. } => methods
                    .iter()
                    .flat_map(|m| m.body.iter())
                    .for_each(|s| walk_stmt(s, name, out)),
            }
        }

        fn walk_expr(expr: &Expr, name: &str, out: &mut Vec<ExprId>) {
            match expr {
                Expr::Variable { id, name: n } if n.lexeme == name => out.push(*id),
                Expr::Assign { value, .. } => walk_expr(value, name, out),
                Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                    walk_expr(left, name, out);
                    walk_expr(right, name, out);
                }
                Expr::Unary { right, .. } => walk_expr(right, name, out),
                Expr::Grouping(inner) => walk_expr(inner, name, out),
                Expr::Call {
                    callee, arguments, ..
                } => {
                    walk_expr(callee, name, out);
                    arguments.iter().for_each(|a| walk_expr(a, name, out));
                }
                Expr::Get { object, .. } => walk_expr(object, name, out),
                Expr::Set { object, value, .. } => {
                    walk_expr(object, name, out);
                    walk_expr(value, name, out);
                }
                _ => {}
            }
        }

        let mut out = Vec::new();
        statements.iter().for_each(|s| walk_stmt(s, name, &mut out));
        out
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_single_error(
            "var a = \"outer\";\n{\n  var a = a;\n}",
            "[line 3] Error at 'a': Can't read local variable in its own initializer.",
        );
    }

    #[test]
    fn test_global_self_reference_is_allowed() {
        assert!(resolve("var a = 1;\nvar a = a;").errors.is_empty());
    }

    #[test]
    fn test_return_at_top_level() {
        assert_single_error(
            "return \"at top level\";",
            "[line 1] Error at 'return': Can't return from top-level code.",
        );
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_single_error(
            "class Foo {\n  init() {\n    return \"something else\";\n  }\n}",
            "[line 3] Error at 'return': Can't return a value from an initializer.",
        );
    }

    #[test]
    fn test_bare_return_in_initializer_is_allowed() {
        assert!(resolve("class Foo { init() { return; } }").errors.is_empty());
    }

    #[test]
    fn test_self_inheritance() {
        assert_single_error(
            "class Oops < Oops {}",
            "[line 1] Error at 'Oops': A class can't inherit from itself.",
        );
    }

    #[test]
    fn test_super_without_superclass() {
        assert_single_error(
            "class Eclair {\n  cook() {\n    super.cook();\n  }\n}",
            "[line 3] Error at 'super': Can't use 'super' in a class with no superclass.",
        );
    }

    #[test]
    fn test_super_outside_class() {
        assert_single_error(
            "super.notEvenAClass();",
            "[line 1] Error at 'super': Can't use 'super' outside of a class.",
        );
    }

    #[test]
    fn test_this_outside_class() {
        assert_single_error(
            "fun f() { return this; }",
            "[line 1] Error at 'this': Can't use 'this' outside of a class.",
        );
    }

    #[test]
    fn test_duplicate_local_declaration() {
        assert_single_error(
            "{\n  var a = 1;\n  var a = 2;\n}",
            "[line 3] Error at 'a': Already a variable with this name in this scope.",
        );
        assert_single_error(
            "fun f(x, x) {}",
            "[line 1] Error at 'x': Already a variable with this name in this scope.",
        );
    }

    #[test]
    fn test_shadowing_an_outer_scope_is_allowed() {
        assert!(resolve("{ var a = 1; { var a = 2; } }").errors.is_empty());
    }

    #[test]
    fn test_errors_accumulate() {
        let resolved = resolve("return 1;\nprint this;\n{ var b = b; }");

        assert_eq!(resolved.errors.len(), 3);
    }

    #[test]
    fn test_globals_are_not_recorded() {
        let resolved = resolve("var a = 1;\nprint a;");
        let ids = variable_ids(&resolved.statements, "a");

        assert_eq!(ids.len(), 1);
        assert_eq!(resolved.interpreter.local_depth(ids[0]), None);
    }

    #[test]
    fn test_distance_counts_enclosing_blocks() {
        let resolved = resolve("{\n  var a = 1;\n  {\n    {\n      print a;\n    }\n    print a;\n  }\n  print a;\n}");
        let ids = variable_ids(&resolved.statements, "a");

        let depths: Vec<Option<usize>> = ids
            .iter()
            .map(|id| resolved.interpreter.local_depth(*id))
            .collect();

        assert_eq!(depths, [Some(2), Some(1), Some(0)]);
    }

    #[test]
    fn test_closure_reference_crosses_function_scope() {
        let resolved = resolve(
            "fun outer() {\n  var x = 1;\n  fun inner() {\n    { print x; }\n  }\n}",
        );
        let ids = variable_ids(&resolved.statements, "x");

        // block → inner body → outer body
        assert_eq!(resolved.interpreter.local_depth(ids[0]), Some(2));
    }

    #[test]
    fn test_deep_nesting_distance() {
        let depth = 40;
        let source = format!(
            "{{ var v = 1; {} print v; {} }}",
            "{ ".repeat(depth),
            "} ".repeat(depth)
        );
        let resolved = resolve(&source);
        let ids = variable_ids(&resolved.statements, "v");

        assert_eq!(resolved.interpreter.local_depth(ids[0]), Some(depth));
    }
}
