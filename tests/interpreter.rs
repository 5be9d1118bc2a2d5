#[cfg(test)]
mod interpreter_tests {
    use olox::{RunMode, Session};
    use pretty_assertions::assert_eq;

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

    /// Runs a program that must not produce any diagnostic.
    fn output_of(source: &str) -> String {
        let (output, diagnostics) = run(source);

        assert_eq!(diagnostics, Vec::<String>::new());

        output
    }

    fn runtime_error(source: &str) -> String {
        let mut session = Session::new(Vec::new());
        session.run(source, RunMode::File);

        assert!(session.reporter().had_runtime_error());
        assert!(!session.reporter().had_build_error());

        session
            .take_diagnostics()
            .last()
            .map(ToString::to_string)
            .unwrap()
    }

    // ───────────────────────── end-to-end programs ─────────────────────────

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(output_of("print 1 + 2 * 3;"), "7\n");
    }

    #[test]
    fn test_block_shadowing() {
        assert_eq!(
            output_of("var a = 1; { var a = 2; print a; } print a;"),
            "2\n1\n"
        );
    }

    #[test]
    fn test_method_call() {
        assert_eq!(
            output_of("class A { hello() { print \"hi\"; } } A().hello();"),
            "hi\n"
        );
    }

    #[test]
    fn test_inherited_initializer_through_super() {
        let source = "class A { init(x) { this.x = x; } } \
                      class B < A { init(x) { super.init(x); this.y = x + 1; } } \
                      var b = B(10); print b.x; print b.y;";

        assert_eq!(output_of(source), "10\n11\n");
    }

    #[test]
    fn test_counter_closure() {
        let source = "fun make(n) { fun inc() { n = n + 1; return n; } return inc; } \
                      var c = make(0); print c(); print c(); print c();";

        assert_eq!(output_of(source), "1\n2\n3\n");
    }

    #[test]
    fn test_break_out_of_for() {
        assert_eq!(
            output_of("for (var i = 0; i < 3; i = i + 1) { if (i == 2) break; print i; }"),
            "0\n1\n"
        );
    }

    #[test]
    fn test_string_concatenation_with_number() {
        assert_eq!(output_of("print \"a\" + 1;"), "a1\n");
        assert_eq!(output_of("print 2.5 + \"b\";"), "2.5b\n");
        assert_eq!(output_of("print \"x\" + nil;"), "xnil\n");
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            runtime_error("print 1 / 0;"),
            "Arithmetic Error: Division by Zero\n[line 1]"
        );
    }

    // ───────────────────────── values ─────────────────────────

    #[test]
    fn test_number_formatting() {
        assert_eq!(
            output_of("print 7; print 10 / 4; print -3; print 0.1 + 0.2 > 0.3;"),
            "7\n2.5\n-3\ntrue\n"
        );
    }

    #[test]
    fn test_large_whole_numbers_print_without_exponent() {
        assert_eq!(
            output_of("print 10000000000000000000000; print 2 * 1000000000000000000000;"),
            "10000000000000000000000\n2000000000000000000000\n"
        );
    }

    #[test]
    fn test_truthiness_table() {
        assert_eq!(
            output_of("print !!nil; print !!false; print !!0; print !!\"\"; print !!\"x\";"),
            "false\nfalse\ntrue\ntrue\ntrue\n"
        );
    }

    #[test]
    fn test_equality() {
        let source = r#"
            print nil == nil;
            print nil == false;
            print 1 == 1;
            print "a" == "a";
            print "1" == 1;
            class A {}
            var a = A();
            print a == a;
            print A() == A();
        "#;

        assert_eq!(
            output_of(source),
            "true\nfalse\ntrue\ntrue\nfalse\ntrue\nfalse\n"
        );
    }

    #[test]
    fn test_short_circuit_returns_deciding_operand() {
        let source = r#"
            print nil or "yes";
            print "first" or undefined;
            print false and undefined;
            print 1 and 2;
            print nil and 1;
            print false or nil;
        "#;

        assert_eq!(output_of(source), "yes\nfirst\nfalse\n2\nnil\nnil\n");
    }

    #[test]
    fn test_comma_and_ternary() {
        assert_eq!(output_of("print (1, 2);"), "2\n");
        assert_eq!(output_of("print true ? 1 : 2;"), "1\n");
        assert_eq!(output_of("print nil ? 1 : false ? 2 : 3;"), "3\n");
    }

    #[test]
    fn test_comma_operands_are_evaluated_left_to_right() {
        assert_eq!(
            output_of("var a = 0; var b = (a = 1, a + 1); print a; print b;"),
            "1\n2\n"
        );
    }

    #[test]
    fn test_stringify_callables_and_objects() {
        let source = r#"
            fun f() {}
            class A {}
            print f;
            print fun () {};
            print clock;
            print A;
            print A();
        "#;

        assert_eq!(
            output_of(source),
            "<fn f>\n<fn>\n<native fn>\nA\nA instance\n"
        );
    }

    #[test]
    fn test_clock_is_a_number() {
        assert_eq!(
            output_of("var t = clock(); print t >= 0; print clock() >= t;"),
            "true\ntrue\n"
        );
    }

    // ───────────────────────── control flow ─────────────────────────

    #[test]
    fn test_for_loop_prints_in_order() {
        assert_eq!(
            output_of("for (var i = 0; i < 4; i = i + 1) print i;"),
            "0\n1\n2\n3\n"
        );
    }

    #[test]
    fn test_break_out_of_while_and_nested_loops() {
        let source = r#"
            var i = 0;
            while (true) {
                var j = 0;
                while (true) {
                    if (j == 2) break;
                    j = j + 1;
                }
                print i + j;
                i = i + 1;
                if (i == 2) break;
            }
            print "done";
        "#;

        assert_eq!(output_of(source), "2\n3\ndone\n");
    }

    #[test]
    fn test_return_unwinds_loops() {
        let source = r#"
            fun first(limit) {
                for (var i = 0; ; i = i + 1) {
                    if (i * i > limit) return i;
                }
            }
            print first(10);
        "#;

        assert_eq!(output_of(source), "4\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(output_of("fun f() {} print f();"), "nil\n");
    }

    #[test]
    fn test_recursion() {
        let source = r#"
            fun fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
            print fib(15);
        "#;

        assert_eq!(output_of(source), "610\n");
    }

    // ───────────────────────── closures ─────────────────────────

    #[test]
    fn test_closures_share_captured_frame() {
        let source = r#"
            fun pair() {
                var n = 0;
                fun inc() { n = n + 1; }
                fun get() { return n; }
                inc();
                inc();
                return get;
            }
            print pair()();
        "#;

        assert_eq!(output_of(source), "2\n");
    }

    #[test]
    fn test_anonymous_function_as_argument() {
        let source = r#"
            fun apply(f, x) { return f(x); }
            print apply(fun (n) { return n * 2; }, 21);
        "#;

        assert_eq!(output_of(source), "42\n");
    }

    // ───────────────────────── classes ─────────────────────────

    #[test]
    fn test_fields_and_bound_methods() {
        let source = r#"
            class Box {
                init(v) { this.v = v; }
                get() { return this.v; }
            }
            var b = Box(1);
            var m = b.get;
            b.v = 2;
            print m();
        "#;

        assert_eq!(output_of(source), "2\n");
    }

    #[test]
    fn test_getter_is_invoked_on_access() {
        let source = r#"
            class Circle {
                init(r) { this.r = r; }
                area { return 3 * this.r * this.r; }
            }
            print Circle(2).area;
        "#;

        assert_eq!(output_of(source), "12\n");
    }

    #[test]
    fn test_initializer_returns_same_instance() {
        let source = r#"
            class C { init() { this.n = 0; } }
            var o = C();
            print o.init() == o;
            print o;
        "#;

        assert_eq!(output_of(source), "true\nC instance\n");
    }

    #[test]
    fn test_early_return_in_initializer_yields_instance() {
        let source = r#"
            class C { init(flag) { if (flag) return; this.late = true; } }
            print C(true);
        "#;

        assert_eq!(output_of(source), "C instance\n");
    }

    #[test]
    fn test_method_inheritance_and_super() {
        let source = r#"
            class A { name() { return "A"; } greet() { return "I am " + this.name(); } }
            class B < A { name() { return "B, not " + super.name(); } }
            print B().greet();
        "#;

        assert_eq!(output_of(source), "I am B, not A\n");
    }

    #[test]
    fn test_class_methods() {
        let source = r#"
            class Math { class square(n) { return n * n; } }
            print Math.square(3);
        "#;

        assert_eq!(output_of(source), "9\n");
    }

    #[test]
    fn test_class_methods_are_inherited() {
        let source = r#"
            class A { class make() { return "made by " + this; } }
            class B < A {}
            print B.make();
        "#;

        assert_eq!(output_of(source), "made by B\n");
    }

    #[test]
    fn test_super_in_class_method() {
        let source = r#"
            class A { class name() { return "A"; } }
            class B < A { class name() { return "B<" + super.name(); } }
            print B.name();
        "#;

        assert_eq!(output_of(source), "B<A\n");
    }

    #[test]
    fn test_class_fields() {
        let source = r#"
            class Counter { class bump() { this.count = this.count + 1; } }
            Counter.count = 1;
            Counter.bump();
            print Counter.count;
        "#;

        assert_eq!(output_of(source), "2\n");
    }

    #[test]
    fn test_local_class_with_superclass() {
        let source = r#"
            {
                class A { m() { return "a"; } }
                class B < A { m() { return super.m() + "b"; } }
                print B().m();
            }
        "#;

        assert_eq!(output_of(source), "ab\n");
    }

    // ───────────────────────── runtime errors ─────────────────────────

    #[test]
    fn test_runtime_error_messages() {
        let cases: &[(&str, &str)] = &[
            ("print -\"a\";", "Operand must be a number.\n[line 1]"),
            ("print \"a\" < 1;", "Operands must be numbers.\n[line 1]"),
            ("print 2 * nil;", "Operands must be numbers.\n[line 1]"),
            ("print true + 1;", "Operands must be two numbers or two strings.\n[line 1]"),
            ("print missing;", "Undefined variable 'missing'.\n[line 1]"),
            ("missing = 1;", "Undefined variable 'missing'.\n[line 1]"),
            ("\"str\"();", "Only functions and classes are callable.\n[line 1]"),
            ("fun f(a) { print a; } f();", "Expected 1 arguments but got 0.\n[line 1]"),
            ("class A {} A(1);", "Expected 0 arguments but got 1.\n[line 1]"),
            ("var x = 1; print x.y;", "Only instances have properties.\n[line 1]"),
            ("var x = 1; x.y = 2;", "Only instances have fields.\n[line 1]"),
            ("class A {} print A().nope;", "Undefined property 'nope'.\n[line 1]"),
            ("var N = 1; class B < N {}", "Superclass must be a class.\n[line 1]"),
        ];

        for (source, expected) in cases {
            assert_eq!(runtime_error(source), *expected, "source: {}", source);
        }
    }

    #[test]
    fn test_runtime_error_reports_line() {
        assert_eq!(
            runtime_error("var a = 1;\n\nprint a + true;"),
            "Operands must be two numbers or two strings.\n[line 3]"
        );
    }

    #[test]
    fn test_runtime_error_stops_program() {
        let (output, diagnostics) = run("print 1; print nil + 1; print 2;");

        assert_eq!(output, "1\n");
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_callee_checked_before_arguments() {
        let (output, _) = run("fun side() { print \"evaluated\"; } nil(side());");

        assert_eq!(output, "");
    }

    #[test]
    fn test_build_error_prevents_execution() {
        let mut session = Session::new(Vec::new());
        session.run("print \"no\"; print ;", RunMode::File);

        assert!(session.reporter().had_build_error());
        assert!(!session.reporter().had_runtime_error());
        assert!(session.output().is_empty());
    }

    // ───────────────────────── interactive sessions ─────────────────────────

    #[test]
    fn test_repl_echoes_top_level_results() {
        let mut session = Session::new(Vec::new());

        session.run("var x = 1", RunMode::Repl);
        session.run("x + 1", RunMode::Repl);
        session.run("print x;", RunMode::Repl);
        session.run("nil", RunMode::Repl);
        session.run("{ var y = 5; y; }", RunMode::Repl);
        session.run("var y;", RunMode::Repl);

        assert_eq!(String::from_utf8(session.into_output()).unwrap(), "x = 1\n2\n1\n");
    }

    #[test]
    fn test_repl_does_not_echo_uninitialized_var() {
        let mut session = Session::new(Vec::new());

        session.run("var x;", RunMode::Repl);
        session.run("x", RunMode::Repl);

        assert!(session.output().is_empty());
    }

    #[test]
    fn test_repl_does_not_echo_loop_or_branch_bodies() {
        let mut session = Session::new(Vec::new());

        session.run("var i = 0;", RunMode::Repl);
        session.run("while (i < 2) i = i + 1", RunMode::Repl);
        session.run("if (true) i;", RunMode::Repl);
        session.run("for (var j = 0; j < 2; j = j + 1) j;", RunMode::Repl);
        session.run("i", RunMode::Repl);

        assert_eq!(String::from_utf8(session.into_output()).unwrap(), "i = 0\n2\n");
    }

    #[test]
    fn test_repl_does_not_echo_inside_functions() {
        let mut session = Session::new(Vec::new());

        session.run("fun f() { var inner = 3; return inner; }", RunMode::Repl);
        session.run("f()", RunMode::Repl);

        assert_eq!(String::from_utf8(session.into_output()).unwrap(), "3\n");
    }

    #[test]
    fn test_repl_recovers_from_errors() {
        let mut session = Session::new(Vec::new());

        session.run("var = ;", RunMode::Repl);
        assert!(session.reporter().had_build_error());

        session.run("print 5;", RunMode::Repl);
        assert!(!session.reporter().had_build_error());

        session.run("missing;", RunMode::Repl);
        assert!(session.reporter().had_runtime_error());

        session.run("print 6;", RunMode::Repl);

        assert_eq!(String::from_utf8(session.into_output()).unwrap(), "5\n6\n");
    }

    #[test]
    fn test_repl_lines_share_globals_and_locals_stay_distinct() {
        let mut session = Session::new(Vec::new());

        session.run("fun add(a) { return a + 1; }", RunMode::Repl);
        session.run("fun twice(b) { return b * 2; }", RunMode::Repl);
        session.run("print add(twice(4));", RunMode::Repl);
        session.run("print twice(add(4));", RunMode::Repl);

        assert!(session.take_diagnostics().is_empty());
        assert_eq!(String::from_utf8(session.into_output()).unwrap(), "9\n10\n");
    }
}
