#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use jasper::error::JasperError;
    use jasper::session::Session;

    /// Shared buffer standing in for stdout.
    #[derive(Clone, Default)]
    struct Capture(Rc<RefCell<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).expect("output is UTF-8")
        }
    }

    fn session() -> (Session, Capture) {
        let capture = Capture::default();
        let session = Session::with_io(Box::new(capture.clone()), Box::new(io::empty()));
        (session, capture)
    }

    /// Run `source` in a fresh session and return what it printed.
    fn run(source: &str) -> String {
        let (mut session, capture) = session();
        session.run(source).expect("program runs");
        capture.text()
    }

    /// Run `source`, expecting a failure; returns the partial output and the error.
    fn run_err(source: &str) -> (String, JasperError) {
        let (mut session, capture) = session();
        let error = session.run(source).expect_err("program fails");
        (capture.text(), error)
    }

    #[test]
    fn arithmetic_and_printing() {
        assert_eq!(
            run("print 1 + 2 * 3; print (1 + 2) * 3; print 7 / 2; print -4; print 10 - 2 - 3;"),
            "7\n9\n3.5\n-4\n5\n"
        );
    }

    #[test]
    fn literals_print_in_canonical_form() {
        assert_eq!(
            run("print nil; print true; print false; print \"text\"; print 2.50;"),
            "nil\ntrue\nfalse\ntext\n2.5\n"
        );
    }

    #[test]
    fn comparisons_and_equality() {
        assert_eq!(
            run("print 1 < 2; print 2 <= 2; print 3 > 4; print 1 == 1; print \"a\" != \"a\"; print nil == false; print 1 == \"1\";"),
            "true\ntrue\nfalse\ntrue\nfalse\nfalse\nfalse\n"
        );
    }

    #[test]
    fn only_nil_and_false_are_falsy() {
        assert_eq!(
            run("print !nil; print !false; print !0; print !\"\"; if (0) print \"zero is truthy\";"),
            "true\ntrue\nfalse\nfalse\nzero is truthy\n"
        );
    }

    #[test]
    fn logical_operators_short_circuit_and_return_operands() {
        let source = r#"
            func boom() { print "evaluated"; return true; }
            print nil or "fallback";
            print 1 and 2;
            print false and boom();
            print true | boom();
            print "x" & nil;
        "#;

        assert_eq!(run(source), "fallback\n2\nfalse\ntrue\nnil\n");
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(run("var a = \"foo\"; print a + \"bar\";"), "foobar\n");
    }

    #[test]
    fn plus_rejects_mixed_operands() {
        let (output, error) = run_err("print \"before\";\nprint \"a\" + 1;\nprint \"after\";");

        assert_eq!(output, "before\n");
        assert_eq!(
            error.to_string(),
            "Operands of '+' must be two numbers or two strings.\n[line 2]"
        );
        assert!(!error.is_static());
    }

    #[test]
    fn numeric_operators_reject_non_numbers() {
        let (_, error) = run_err("print true < 1;");
        assert_eq!(
            error.to_string(),
            "Operands of '<' must be numbers.\n[line 1]"
        );

        let (_, error) = run_err("print -\"x\";");
        assert_eq!(error.to_string(), "Operand of '-' must be a number.\n[line 1]");
    }

    #[test]
    fn division_by_zero_follows_ieee() {
        assert_eq!(run("print 1 / 0 > 1000000;"), "true\n");
    }

    #[test]
    fn block_scoping_shadows_and_restores() {
        let source = r#"
            var a = "global";
            {
                var a = "outer";
                {
                    var a = "inner";
                    print a;
                }
                print a;
            }
            print a;
        "#;

        assert_eq!(run(source), "inner\nouter\nglobal\n");
    }

    #[test]
    fn assignment_updates_enclosing_binding() {
        assert_eq!(run("var a = 1; { a = 2; } print a; print a = 3;"), "2\n3\n");
    }

    #[test]
    fn while_and_for_loops() {
        let source = r#"
            var i = 0;
            while (i < 3) { print i; i = i + 1; }
            for (var j = 0; j < 2; j = j + 1) print j * 10;
        "#;

        assert_eq!(run(source), "0\n1\n2\n0\n10\n");
    }

    #[test]
    fn recursive_factorial() {
        let source = r#"
            func fact(n) {
                if (n <= 1) return 1;
                return n * fact(n - 1);
            }
            print fact(5);
        "#;

        assert_eq!(run(source), "120\n");
    }

    #[test]
    fn return_unwinds_out_of_loops() {
        let source = r#"
            func first_over(limit) {
                for (var i = 0; ; i = i + 1) {
                    if (i > limit) return i;
                }
            }
            print first_over(4);
        "#;

        assert_eq!(run(source), "5\n");
    }

    #[test]
    fn function_without_return_yields_nil() {
        assert_eq!(run("func f() {} print f(); print f;"), "nil\n<fn f>\n");
    }

    #[test]
    fn closures_capture_their_environment() {
        let source = r#"
            func make_counter() {
                var count = 0;
                func counter() {
                    count = count + 1;
                    return count;
                }
                return counter;
            }
            var a = make_counter();
            var b = make_counter();
            print a();
            print a();
            print b();
        "#;

        assert_eq!(run(source), "1\n2\n1\n");
    }

    #[test]
    fn closures_share_a_captured_variable() {
        let source = r#"
            var get;
            var set;
            func make_cell() {
                var value = "initial";
                func read() { return value; }
                func write(v) { value = v; }
                get = read;
                set = write;
            }
            make_cell();
            print get();
            set("updated");
            print get();
        "#;

        assert_eq!(run(source), "initial\nupdated\n");
    }

    #[test]
    fn closures_bind_lexically_not_dynamically() {
        let source = r#"
            var a = "global";
            {
                func show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#;

        assert_eq!(run(source), "global\nglobal\n");
    }

    #[test]
    fn instances_have_independent_fields() {
        let source = r#"
            class Point {}
            var p = Point();
            var q = Point();
            p.x = 1;
            q.x = 2;
            print p.x;
            print q.x;
            print p;
            print Point;
        "#;

        assert_eq!(run(source), "1\n2\nPointInstance\n<class Point>\n");
    }

    #[test]
    fn methods_bind_this() {
        let source = r#"
            class Greeter {
                init(name) { this.name = name; }
                greet() { return "hi " + this.name; }
            }
            var g = Greeter("ann");
            var greet = g.greet;
            print greet();
        "#;

        assert_eq!(run(source), "hi ann\n");
    }

    #[test]
    fn fields_shadow_methods() {
        let source = r#"
            class A { m() { return "method"; } }
            var a = A();
            a.m = "field";
            print a.m;
        "#;

        assert_eq!(run(source), "field\n");
    }

    #[test]
    fn initializer_returns_the_instance() {
        let source = r#"
            class A {
                init() { this.v = 1; return; }
            }
            var a = A();
            print a.init();
            print a.v;
        "#;

        assert_eq!(run(source), "AInstance\n1\n");
    }

    #[test]
    fn inheritance_and_super_dispatch() {
        let source = r#"
            class A {
                name() { return "A"; }
                describe() { return "I am " + this.name(); }
            }
            class B < A {
                name() { return "B"; }
                describe() { return super.describe() + "!"; }
            }
            class C < B {}
            print B().describe();
            print C().describe();
        "#;

        assert_eq!(run(source), "I am B!\nI am B!\n");
    }

    #[test]
    fn class_arity_follows_init() {
        let (_, error) = run_err("class P { init(x, y) {} }\nP(1);");

        assert_eq!(error.to_string(), "Expected 2 arguments but got 1.\n[line 2]");
    }

    #[test]
    fn function_arity_is_checked() {
        let (_, error) = run_err("func f(a) {}\nf();");

        assert_eq!(error.to_string(), "Expected 1 arguments but got 0.\n[line 2]");
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let (_, error) = run_err("print missing;");
        assert_eq!(error.to_string(), "Undefined variable 'missing'.\n[line 1]");

        let (_, error) = run_err("missing = 1;");
        assert_eq!(error.to_string(), "Undefined variable 'missing'.\n[line 1]");
    }

    #[test]
    fn calling_a_non_callable_fails() {
        let (_, error) = run_err("\"text\"();");

        assert_eq!(error.to_string(), "Can only call functions and classes.\n[line 1]");
    }

    #[test]
    fn property_access_requires_an_instance() {
        let (_, error) = run_err("var x = 1; print x.y;");
        assert_eq!(error.to_string(), "Only instances have properties.\n[line 1]");

        let (_, error) = run_err("var x = 1; x.y = 2;");
        assert_eq!(error.to_string(), "Only instances have fields.\n[line 1]");

        let (_, error) = run_err("class A {} print A().nope;");
        assert_eq!(error.to_string(), "Undefined property 'nope'.\n[line 1]");
    }

    #[test]
    fn superclass_must_be_a_class() {
        let (_, error) = run_err("var NotAClass = 1; class B < NotAClass {}");

        assert_eq!(error.to_string(), "Superclass must be a class.\n[line 1]");
    }

    #[test]
    fn static_errors_prevent_execution() {
        let (output, error) = run_err("print \"ran\";\nprint ;");

        assert_eq!(output, "");
        assert!(error.is_static());
        assert_eq!(
            error.to_string(),
            "[line 2] Error at ';': Expect expression."
        );
    }

    #[test]
    fn resolution_errors_prevent_execution() {
        let (output, error) = run_err("print \"ran\";\nreturn 1;");

        assert_eq!(output, "");
        assert!(error.is_static());
    }

    #[test]
    fn lexical_and_syntax_errors_are_reported_together() {
        let (_, error) = run_err("var a = @;\nprint (1;");

        let JasperError::Static(errors) = error else {
            panic!("expected static errors");
        };

        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Unexpected character: @"
        );
    }

    #[test]
    fn fresh_sessions_produce_identical_output() {
        let source = r#"
            class Counter {
                init() { this.n = 0; }
                tick() { this.n = this.n + 1; return this.n; }
            }
            var c = Counter();
            c.tick();
            print c.tick();
        "#;

        assert_eq!(run(source), run(source));
        assert_eq!(run(source), "2\n");
    }

    #[test]
    fn globals_persist_between_runs() {
        let (mut session, capture) = session();

        session.run("var total = 1;").expect("first line runs");
        session.run("func add(n) { total = total + n; }").expect("second line runs");
        session.run("add(41);").expect("third line runs");
        session.run("print total;").expect("fourth line runs");

        assert_eq!(capture.text(), "42\n");
    }

    #[test]
    fn session_survives_a_failed_run() {
        let (mut session, capture) = session();

        session.run("var a = 1;").expect("definition runs");
        assert!(session.run("print a + nil;").is_err());
        assert!(session.run("print (;").is_err());
        session.run("print a;").expect("session is still usable");

        assert_eq!(capture.text(), "1\n");
    }

    #[test]
    fn deep_recursion_completes() {
        let source = r#"
            func count(n) {
                if (n == 0) return 0;
                return 1 + count(n - 1);
            }
            print count(10000);
        "#;

        assert_eq!(run(source), "10000\n");
    }

    #[test]
    fn runaway_recursion_is_a_runtime_error() {
        let (mut session, capture) = session();

        let error = session
            .run("print \"start\";\nfunc forever(n) { return forever(n + 1); }\nforever(0);")
            .expect_err("recursion is cut off");

        assert_eq!(capture.text(), "start\n");
        assert!(!error.is_static());
        assert_eq!(error.to_string(), "Stack overflow.\n[line 2]");

        // The depth counter unwinds with the error.
        session
            .run("func twice(n) { if (n == 0) return 0; return twice(n - 1); } print twice(100);")
            .expect("session is still usable");
        assert_eq!(capture.text(), "start\n0\n");
    }

    #[test]
    fn negative_zero_keeps_its_sign() {
        assert_eq!(run("print -0; print 0;"), "-0\n0\n");
    }

    #[test]
    fn deep_recursion_of_closures_keeps_scopes_apart() {
        let source = r#"
            func fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(15);
        "#;

        assert_eq!(run(source), "610\n");
    }
}
