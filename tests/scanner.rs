#[cfg(test)]
mod scanner_tests {
    use treelox as lox;

    use lox::diagnostics::Diagnostics;
    use lox::scanner::*;
    use lox::token::*;

    /// Scan `source` line by line and return the diagnostics followed by the
    /// rendered tokens.
    fn tokenize(source: &str) -> Vec<String> {
        let mut diagnostics = Diagnostics::new();
        let mut scanner = Scanner::new();

        for (i, line) in source.split('\n').enumerate() {
            scanner.scan_line(i, line, &mut diagnostics);
        }

        diagnostics
            .errors()
            .iter()
            .map(|e| e.to_string())
            .chain(scanner.tokens().iter().map(|t| t.to_string()))
            .collect()
    }

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let mut diagnostics = Diagnostics::new();
        let mut scanner = Scanner::new();
        scanner.scan_source(source, &mut diagnostics);

        let tokens = scanner.tokens();
        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_unexpected_chars_are_reported_and_skipped() {
        assert_eq!(
            tokenize(",.$(#"),
            [
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
                "COMMA , null",
                "DOT . null",
                "LEFT_PAREN ( null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            tokenize("={===}"),
            [
                "EQUAL = null",
                "LEFT_BRACE { null",
                "EQUAL_EQUAL == null",
                "EQUAL = null",
                "RIGHT_BRACE } null",
                "EOF  null",
            ]
        );

        assert_eq!(
            tokenize("!!==="),
            ["BANG ! null", "BANG_EQUAL != null", "EQUAL_EQUAL == null", "EOF  null"]
        );

        assert_token_sequence(
            "<= >= < >",
            &[
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER, ">"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_comments_and_whitespace() {
        assert_eq!(tokenize("/"), ["SLASH / null", "EOF  null"]);
        assert_eq!(tokenize("// comment"), ["EOF  null"]);
        assert_eq!(
            tokenize("( )\n\t"),
            ["LEFT_PAREN ( null", "RIGHT_PAREN ) null", "EOF  null"]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(tokenize("\"foo baz\""), ["STRING \"foo baz\" foo baz", "EOF  null"]);
        assert_eq!(
            tokenize("\"foo <\t>bar 123 // hello world!\""),
            [
                "STRING \"foo <\t>bar 123 // hello world!\" foo <\t>bar 123 // hello world!",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_unterminated_string_emits_no_token() {
        assert_eq!(
            tokenize("\"bar"),
            ["[line 1] Error: Unterminated string.", "EOF  null"]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokenize("1234.1234"),
            ["NUMBER 1234.1234 1234.1234", "EOF  null"]
        );
        assert_eq!(
            tokenize("1234.1234.1234."),
            [
                "NUMBER 1234.1234 1234.1234",
                "DOT . null",
                "NUMBER 1234 1234.0",
                "DOT . null",
                "EOF  null",
            ]
        );
        assert_eq!(
            tokenize("num2 = 200.00"),
            [
                "IDENTIFIER num2 null",
                "EQUAL = null",
                "NUMBER 200.00 200.0",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_identifiers_and_keywords() {
        assert_eq!(
            tokenize("foo bar _hello"),
            [
                "IDENTIFIER foo null",
                "IDENTIFIER bar null",
                "IDENTIFIER _hello null",
                "EOF  null",
            ]
        );

        assert_token_sequence(
            "and class else false for fun if nil or print return super this true var while",
            &[
                (TokenType::AND, "and"),
                (TokenType::CLASS, "class"),
                (TokenType::ELSE, "else"),
                (TokenType::FALSE, "false"),
                (TokenType::FOR, "for"),
                (TokenType::FUN, "fun"),
                (TokenType::IF, "if"),
                (TokenType::NIL, "nil"),
                (TokenType::OR, "or"),
                (TokenType::PRINT, "print"),
                (TokenType::RETURN, "return"),
                (TokenType::SUPER, "super"),
                (TokenType::THIS, "this"),
                (TokenType::TRUE, "true"),
                (TokenType::VAR, "var"),
                (TokenType::WHILE, "while"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_mixed_line_with_errors() {
        assert_eq!(
            tokenize("\"Hello\" = \"Hello\" && 42 == 42"),
            [
                "[line 1] Error: Unexpected character: &",
                "[line 1] Error: Unexpected character: &",
                "STRING \"Hello\" Hello",
                "EQUAL = null",
                "STRING \"Hello\" Hello",
                "NUMBER 42 42.0",
                "EQUAL_EQUAL == null",
                "NUMBER 42 42.0",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_line_numbers_follow_line_index() {
        let mut diagnostics = Diagnostics::new();
        let mut scanner = Scanner::new();
        scanner.scan_source("var a = 1;\n\nprint a;\n@", &mut diagnostics);

        let print = scanner
            .tokens()
            .iter()
            .find(|t| t.token_type == TokenType::PRINT)
            .map(|t| t.line);

        assert_eq!(print, Some(3));
        assert_eq!(diagnostics.lexical_errors().len(), 1);
        assert_eq!(
            diagnostics.lexical_errors()[0].to_string(),
            "[line 4] Error: Unexpected character: @"
        );
    }

    #[test]
    fn test_incremental_scanning_keeps_a_single_eof() {
        let mut diagnostics = Diagnostics::new();
        let mut scanner = Scanner::new();

        scanner.scan_line(0, "var a", &mut diagnostics);
        scanner.scan_line(1, "= 1;", &mut diagnostics);

        let eofs = scanner
            .tokens()
            .iter()
            .filter(|t| t.token_type == TokenType::EOF)
            .count();

        assert_eq!(eofs, 1);
        assert_eq!(scanner.tokens().len(), 6);
        assert_eq!(scanner.tokens()[5].line, 2);
    }

    #[test]
    fn test_number_literal_payload() {
        let mut diagnostics = Diagnostics::new();
        let mut scanner = Scanner::new();
        scanner.scan_source("12.5 \"str\"", &mut diagnostics);

        let tokens = scanner.tokens();

        assert_eq!(tokens[0].literal(), Some(LiteralValue::Number(12.5)));
        assert_eq!(tokens[1].literal(), Some(LiteralValue::Str("str".into())));
        assert_eq!(tokens[2].literal(), None);
    }
}
