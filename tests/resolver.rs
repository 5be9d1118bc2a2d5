#[cfg(test)]
mod resolver_tests {
    use olox::diagnostics::Reporter;
    use olox::interpreter::{Binding, Interpreter};
    use olox::parser::Parser;
    use olox::resolver::Resolver;
    use olox::scanner::scan_tokens;
    use olox::{RunMode, Session};
    use pretty_assertions::assert_eq;

    /// Scan, parse and resolve only. Returns every diagnostic.
    fn resolve(source: &str) -> Vec<String> {
        let mut reporter = Reporter::new();
        let mut interpreter = Interpreter::new(Vec::new());

        let tokens = scan_tokens(source, &mut reporter);
        let statements = Parser::new(&tokens, RunMode::File, &mut reporter).parse();
        assert!(!reporter.had_build_error(), "{:?}", reporter.diagnostics());

        Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);

        reporter
            .diagnostics()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn run(source: &str) -> (String, Vec<String>) {
        let mut session = Session::new(Vec::new());
        session.run(source, RunMode::File);

        let diagnostics = session
            .take_diagnostics()
            .iter()
            .map(ToString::to_string)
            .collect();
        let output = String::from_utf8(session.into_output()).unwrap();

        (output, diagnostics)
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_eq!(
            resolve("{ var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_global_may_read_itself() {
        assert!(resolve("var a = 1; var a = a;").is_empty());
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert_eq!(
            resolve("{ var a = 1; var a = 2; print a; }"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_return_rules() {
        assert_eq!(
            resolve("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
        assert_eq!(
            resolve("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );
        assert!(resolve("class A { init() { return; } }").is_empty());
    }

    #[test]
    fn test_this_and_super_rules() {
        assert_eq!(
            resolve("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            resolve("fun f() { super.m(); }"),
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
        assert_eq!(
            resolve("class A { m() { super.m(); } }"),
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn test_class_cannot_inherit_from_itself() {
        assert_eq!(
            resolve("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_unused_locals_are_warnings() {
        let (output, diagnostics) = run("{ var unused = 1;\n var other = 2; }\nprint \"ran\";");

        assert_eq!(
            diagnostics,
            vec![
                "[line 1] Warning at 'unused': Local variable is never used.",
                "[line 2] Warning at 'other': Local variable is never used.",
            ]
        );
        assert_eq!(output, "ran\n");
    }

    #[test]
    fn test_assignment_alone_is_not_a_use() {
        assert_eq!(
            resolve("fun f() { var a; a = 1; }"),
            vec!["[line 1] Warning at 'a': Local variable is never used."]
        );
    }

    #[test]
    fn test_bindings_use_distance_and_slot() {
        let mut reporter = Reporter::new();
        let mut interpreter = Interpreter::new(Vec::new());

        // ids: a (0) in the print, b (1), a (2) in the inner function
        let source = "fun f(a, b) { print a; fun g() { return b + a; } return g; }";
        let tokens = scan_tokens(source, &mut reporter);
        let statements = Parser::new(&tokens, RunMode::File, &mut reporter).parse();

        Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);

        assert_eq!(interpreter.binding(0), Some(Binding { distance: 0, slot: 0 }));
        assert_eq!(interpreter.binding(1), Some(Binding { distance: 1, slot: 1 }));
        assert_eq!(interpreter.binding(2), Some(Binding { distance: 1, slot: 0 }));
        // `g` in `return g;` lives in f's frame after both parameters.
        assert_eq!(interpreter.binding(3), Some(Binding { distance: 0, slot: 2 }));
    }

    #[test]
    fn test_globals_are_not_bound() {
        let mut reporter = Reporter::new();
        let mut interpreter = Interpreter::new(Vec::new());

        let tokens = scan_tokens("var x = 1; fun f() { return x; }", &mut reporter);
        let statements = Parser::new(&tokens, RunMode::File, &mut reporter).parse();

        Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);

        assert_eq!(interpreter.binding(0), None);
    }

    #[test]
    fn test_closure_sees_binding_at_declaration() {
        let (output, diagnostics) = run(
            r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
                print a;
            }
            "#,
        );

        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(output, "global\nglobal\nblock\n");
    }

    #[test]
    fn test_resolve_errors_stop_execution() {
        let (output, diagnostics) = run("print \"before\"; return;");

        assert_eq!(output, "");
        assert_eq!(
            diagnostics,
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }
}
