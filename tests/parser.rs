#[cfg(test)]
mod parser_tests {
    use treelox as lox;

    use lox::ast::*;
    use lox::ast_printer::AstPrinter;
    use lox::diagnostics::Diagnostics;
    use lox::parser::*;
    use lox::scanner::Scanner;

    /// Parse `source`, returning each statement in prefix form and every
    /// syntax error message.
    fn parse(source: &str) -> (Vec<String>, Vec<String>) {
        let mut diagnostics = Diagnostics::new();
        let mut scanner = Scanner::new();
        scanner.scan_source(source, &mut diagnostics);

        let statements = Parser::new(scanner.tokens(), &mut diagnostics).parse();

        let printed = statements.iter().map(AstPrinter::print_stmt).collect();
        let errors = diagnostics
            .syntax_errors()
            .iter()
            .map(|e| e.to_string())
            .collect();

        (printed, errors)
    }

    fn parse_ok(source: &str) -> Vec<String> {
        let (printed, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected syntax errors: {:?}", errors);
        printed
    }

    fn parse_repl(source: &str) -> ReplInput {
        let mut diagnostics = Diagnostics::new();
        let mut scanner = Scanner::new();
        scanner.scan_source(source, &mut diagnostics);

        Parser::new(scanner.tokens(), &mut diagnostics).parse_repl()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse_ok("1 + 2 * 3 - 4 / 2;"),
            ["(; (- (+ 1.0 (* 2.0 3.0)) (/ 4.0 2.0)))"]
        );
        assert_eq!(
            parse_ok("-(1 + 2) == !true;"),
            ["(; (== (- (group (+ 1.0 2.0))) (! true)))"]
        );
        assert_eq!(
            parse_ok("1 < 2 == 3 >= 4;"),
            ["(; (== (< 1.0 2.0) (>= 3.0 4.0)))"]
        );
    }

    #[test]
    fn test_logical_operators_bind_looser_than_equality() {
        assert_eq!(
            parse_ok("a or b and c == d;"),
            ["(; (or a (and b (== c d))))"]
        );
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(parse_ok("a = b = 3;"), ["(; (= a (= b 3.0)))"]);
        assert_eq!(parse_ok("obj.field = 1;"), ["(; (= obj field 1.0))"]);
        assert_eq!(
            parse_ok("a.b.c = d.e;"),
            ["(; (= (. a b) c (. d e)))"]
        );
    }

    #[test]
    fn test_invalid_assignment_target_keeps_parsing() {
        let (printed, errors) = parse("1 + 2 = 3;\nprint 4;");

        assert_eq!(errors, ["[line 1] Error at '=': Invalid assignment target."]);
        assert_eq!(printed, ["(; (+ 1.0 2.0))", "(print 4.0)"]);
    }

    #[test]
    fn test_for_desugars_to_while() {
        assert_eq!(
            parse_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
            ["(block (var i = 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
        );
        assert_eq!(parse_ok("for (;;) print 1;"), ["(while true (print 1.0))"]);
    }

    #[test]
    fn test_if_else_and_while() {
        assert_eq!(
            parse_ok("if (a) print 1; else { print 2; }"),
            ["(if-else a (print 1.0) (block (print 2.0)))"]
        );
        assert_eq!(
            parse_ok("while (x) x = x - 1;"),
            ["(while x (; (= x (- x 1.0))))"]
        );
    }

    #[test]
    fn test_function_and_class_declarations() {
        assert_eq!(
            parse_ok("fun add(a, b) { return a + b; }"),
            ["(fun add(a b) (return (+ a b)))"]
        );
        assert_eq!(
            parse_ok(
                "class B < A {\n  init(x) { this.x = x; }\n  get() { return super.get(); }\n}"
            ),
            ["(class B < A (method init(x) (; (= this x x))) (method get() (return (call (super get)))))"]
        );
        assert_eq!(parse_ok("fun f() { return; }"), ["(fun f() (return))"]);
    }

    #[test]
    fn test_calls_and_properties() {
        assert_eq!(
            parse_ok("a.b(1, \"two\").c;"),
            ["(; (. (call (. a b) 1.0 two) c))"]
        );
        assert_eq!(parse_ok("f()();"), ["(; (call (call f)))"]);
    }

    #[test]
    fn test_panic_mode_recovery() {
        let (printed, errors) = parse("var = 1;\nprint 2;\nvar x = ;\nprint 3;");

        assert_eq!(
            errors,
            [
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at ';': Expect expression.",
            ]
        );
        assert_eq!(printed, ["(print 2.0)", "(print 3.0)"]);
    }

    #[test]
    fn test_missing_semicolon_at_end_of_print() {
        let (printed, errors) = parse("print 1");

        assert!(printed.is_empty());
        assert_eq!(errors, ["[line 1] Error at end: Expect ';' after value."]);
    }

    #[test]
    fn test_super_requires_method_name() {
        let (_, errors) = parse("super;");

        assert_eq!(errors, ["[line 1] Error at ';': Expect '.' after 'super'."]);
    }

    #[test]
    fn test_too_many_arguments_is_reported_without_unwinding() {
        let args = vec!["0"; 256].join(", ");
        let (printed, errors) = parse(&format!("f({});", args));

        assert_eq!(printed.len(), 1);
        assert_eq!(errors, ["[line 1] Error at '0': Can't have more than 255 arguments."]);
    }

    #[test]
    fn test_trailing_expression_without_semicolon() {
        assert_eq!(parse_ok("print 1;\n1 + 2"), ["(print 1.0)", "(; (+ 1.0 2.0))"]);
    }

    #[test]
    fn test_repl_bare_expression() {
        match parse_repl("1 + 2") {
            ReplInput::Expression(expr) => assert_eq!(AstPrinter::print(&expr), "(+ 1.0 2.0)"),
            other => panic!("expected a bare expression, got {:?}", other),
        }

        assert!(matches!(parse_repl("1 + 2;"), ReplInput::Statements(s) if s.len() == 1));
        assert!(matches!(parse_repl("print 1;"), ReplInput::Statements(_)));
    }

    #[test]
    fn test_repl_expression_after_a_statement_needs_semicolon() {
        let mut diagnostics = Diagnostics::new();
        let mut scanner = Scanner::new();
        scanner.scan_source("print 1; 2", &mut diagnostics);

        let input = Parser::new(scanner.tokens(), &mut diagnostics).parse_repl();

        match input {
            ReplInput::Statements(statements) => {
                let printed: Vec<String> = statements.iter().map(AstPrinter::print_stmt).collect();
                assert_eq!(printed, ["(print 1.0)"]);
            }
            other => panic!("expected statements, got {:?}", other),
        }
        assert_eq!(
            diagnostics.syntax_errors()[0].to_string(),
            "[line 1] Error at end: Expect ';' after expression."
        );
    }

    #[test]
    fn test_expression_ids_are_unique_and_continue() {
        let mut diagnostics = Diagnostics::new();
        let mut scanner = Scanner::new();
        scanner.scan_source("a; a;", &mut diagnostics);

        let mut parser = Parser::new(scanner.tokens(), &mut diagnostics).starting_at(10);
        let statements = parser.parse();

        let ids: Vec<ExprId> = statements
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. }) => Some(*id),
                _ => None,
            })
            .collect();

        assert_eq!(ids, [ExprId(10), ExprId(11)]);
        assert_eq!(parser.next_id(), 12);
    }
}
