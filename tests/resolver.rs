#[cfg(test)]
mod resolver_tests {
    use std::io;

    use jasper::error::JasperError;
    use jasper::interpreter::Interpreter;
    use jasper::resolver::Resolver;
    use jasper::session::compile;

    fn resolve_errors(source: &str) -> Vec<String> {
        let statements = compile(source).expect("source parses");
        let mut interpreter = Interpreter::with_io(Box::new(io::sink()), Box::new(io::empty()));

        match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => Vec::new(),
            Err(JasperError::Static(errors)) => errors.iter().map(ToString::to_string).collect(),
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn valid_program_resolves_cleanly() {
        let errors = resolve_errors(
            "var a = 1;
             func f(x) { var y = x; { var a = y; return a; } }
             class A { init() { this.v = 1; } }
             class B < A { m() { return super.init(); } }",
        );

        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn reading_local_in_own_initializer_is_rejected() {
        let errors = resolve_errors("var a = 1; { var a = a; }");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn globals_may_reference_themselves() {
        assert!(resolve_errors("var a = a;").is_empty());
    }

    #[test]
    fn redeclaring_in_same_local_scope_is_rejected() {
        let errors = resolve_errors("{ var a = 1; var a = 2; }");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn duplicate_parameters_are_rejected() {
        let errors = resolve_errors("func f(a, a) {}");

        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn top_level_return_is_rejected() {
        let errors = resolve_errors("return 1;");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn returning_a_value_from_init_is_rejected() {
        let errors = resolve_errors("class A { init() { return 1; } }");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );
    }

    #[test]
    fn bare_return_from_init_is_allowed() {
        assert!(resolve_errors("class A { init() { return; } }").is_empty());
    }

    #[test]
    fn this_and_super_outside_classes_are_rejected() {
        let errors = resolve_errors("print this;\nfunc f() { super.g(); }");

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at 'this': Can't use 'this' outside of a class.",
                "[line 2] Error at 'super': Can't use 'super' outside of a class.",
            ]
        );
    }

    #[test]
    fn super_without_superclass_is_rejected() {
        let errors = resolve_errors("class A { m() { super.m(); } }");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn class_cannot_inherit_from_itself() {
        let errors = resolve_errors("class A < A {}");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn resolution_continues_after_the_first_error() {
        let errors = resolve_errors("return;\n{ var x = 1; var x = 2; }\nprint this;");

        assert_eq!(errors.len(), 3);
    }
}
