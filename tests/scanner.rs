#[cfg(test)]
mod scanner_tests {
    use olox::diagnostics::Reporter;
    use olox::scanner::*;
    use olox::token::*;
    use olox::LoxError;
    use pretty_assertions::assert_eq;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn errors(source: &str) -> Vec<String> {
        let mut reporter = Reporter::new();
        scan_tokens(source, &mut reporter);

        reporter.diagnostics().iter().map(ToString::to_string).collect()
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
    fn test_scanner_02_ternary_and_two_char_operators() {
        assert_token_sequence(
            "a ? b : c != d == e <= f >= g",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::QUESTION, "?"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::COLON, ":"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::IDENTIFIER, "d"),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::IDENTIFIER, "e"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::IDENTIFIER, "f"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::IDENTIFIER, "g"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords() {
        assert_token_sequence(
            "while (true) break; classy class _under",
            &[
                (TokenType::WHILE, "while"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::TRUE, "true"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::BREAK, "break"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "_under"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_comments_are_skipped() {
        assert_token_sequence(
            "1 // line comment\n/* block /* nested */ still comment */ 2 / 3",
            &[
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::NUMBER(0.0), "2"),
                (TokenType::SLASH, "/"),
                (TokenType::NUMBER(0.0), "3"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_literal_payloads() {
        let tokens: Vec<Token> = Scanner::new("12.5 \"hi there\" 7.")
            .filter_map(Result::ok)
            .collect();

        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 12.5));
        assert!(matches!(&tokens[1].token_type, TokenType::STRING(s) if s == "hi there"));
        // A trailing dot is not part of the number.
        assert!(matches!(tokens[2].token_type, TokenType::NUMBER(n) if n == 7.0));
        assert_eq!(tokens[3].token_type, TokenType::DOT);
    }

    #[test]
    fn test_token_dump_format() {
        let dump: Vec<String> = Scanner::new("var x = 3; print \"s\";")
            .filter_map(Result::ok)
            .map(|token| token.to_string())
            .collect();

        assert_eq!(
            dump,
            vec![
                "VAR var null",
                "IDENTIFIER x null",
                "EQUAL = null",
                "NUMBER 3 3.0",
                "SEMICOLON ; null",
                "PRINT print null",
                "STRING \"s\" s",
                "SEMICOLON ; null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_token_json() {
        let tokens: Vec<Token> = Scanner::new("(\n42").filter_map(Result::ok).collect();

        assert_eq!(
            serde_json::to_string(&tokens[0]).unwrap(),
            r#"{"token_type":"LEFT_PAREN","lexeme":"(","line":1}"#
        );
        assert_eq!(
            serde_json::to_string(&tokens[1]).unwrap(),
            r#"{"token_type":{"NUMBER":42.0},"lexeme":"42","line":2}"#
        );
    }

    #[test]
    fn test_line_numbers() {
        let lines: Vec<usize> = Scanner::new("a\nb\n\n/* x\n y */ c")
            .filter_map(Result::ok)
            .map(|token| token.line)
            .collect();

        assert_eq!(lines, vec![1, 2, 5, 5]);
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let messages: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            messages,
            vec![
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
            ]
        );

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_multibyte_unexpected_character_reported_once() {
        assert_eq!(errors("é"), vec!["[line 1] Error: Unexpected character: é"]);
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            errors("print \"never closed\n;"),
            vec!["[line 2] Error: Unterminated string."]
        );
    }

    #[test]
    fn test_unterminated_block_comment_reports_opening_line() {
        assert_eq!(
            errors("1;\n/* outer\n/* inner */\n"),
            vec!["[line 2] Error: Unterminated block comment."]
        );
    }

    #[test]
    fn test_scan_tokens_keeps_going_after_errors() {
        let mut reporter = Reporter::new();
        let tokens: Vec<Token> = scan_tokens("@ 1 @ 2", &mut reporter);

        assert!(reporter.had_build_error());
        assert_eq!(reporter.diagnostics().len(), 2);
        assert_eq!(tokens.len(), 3);
        assert!(tokens[2].is_eof());
    }
}
