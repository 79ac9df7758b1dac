#[cfg(test)]
mod natives_tests {
    use std::cell::RefCell;
    use std::fs;
    use std::io::{self, Cursor, Write};
    use std::path::PathBuf;
    use std::process;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use jasper::error::JasperError;
    use jasper::session::Session;

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

    /// Run `source` with `stdin` as its input stream.
    fn run_with_input(source: &str, stdin: &str) -> (String, Result<(), JasperError>) {
        let capture = Capture::default();
        let mut session = Session::with_io(
            Box::new(capture.clone()),
            Box::new(Cursor::new(stdin.as_bytes().to_vec())),
        );

        let result = session.run(source);
        (capture.text(), result)
    }

    fn run(source: &str) -> String {
        let (output, result) = run_with_input(source, "");
        result.expect("program runs");
        output
    }

    fn run_err(source: &str) -> String {
        let (_, result) = run_with_input(source, "");
        result.expect_err("program fails").to_string()
    }

    /// A path in the temp directory no other test uses.
    fn scratch_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("jasper-{}-{}.txt", tag, process::id()))
    }

    #[test]
    fn natives_are_predefined_globals() {
        assert_eq!(
            run("print clock; print printf; print input; print file_read; print file_write;"),
            "<native fn clock>\n<native fn printf>\n<native fn input>\n<native fn file_read>\n<native fn file_write>\n"
        );
    }

    #[test]
    fn clock_returns_increasing_seconds() {
        assert_eq!(
            run("var a = clock(); var b = clock(); print a > 1000000000; print b >= a;"),
            "true\ntrue\n"
        );
    }

    #[test]
    fn clock_takes_no_arguments() {
        assert_eq!(run_err("clock(1);"), "Expected 0 arguments but got 1.\n[line 1]");
    }

    #[test]
    fn printf_formats_without_trailing_newline() {
        assert_eq!(
            run("printf(\"{} + {} = {}\", 1, 2, 1 + 2); printf(\"|{{}}|\"); print \"\";"),
            "1 + 2 = 3|{}|\n"
        );
    }

    #[test]
    fn printf_renders_values_like_print() {
        assert_eq!(
            run("class A {} printf(\"{} {} {} {}\", nil, true, A(), 2.5);"),
            "nil true AInstance 2.5"
        );
    }

    #[test]
    fn printf_placeholder_mismatch_is_an_error() {
        assert_eq!(
            run_err("printf(\"{} {}\", 1);"),
            "Not enough arguments for printf format.\n[line 1]"
        );
        assert_eq!(
            run_err("printf(\"{}\", 1, 2);"),
            "Too many arguments for printf format.\n[line 1]"
        );
    }

    #[test]
    fn printf_requires_a_string_format() {
        assert_eq!(
            run_err("printf(1);"),
            "printf format must be a string, got number.\n[line 1]"
        );
        assert_eq!(run_err("printf();"), "printf expects a format string.\n[line 1]");
    }

    #[test]
    fn input_reads_lines_then_nil() {
        let (output, result) = run_with_input(
            "print input(); print input(); print input();",
            "first\r\nsecond\n",
        );

        result.expect("program runs");
        assert_eq!(output, "first\nsecond\nnil\n");
    }

    #[test]
    fn input_without_trailing_newline() {
        let (output, result) = run_with_input("var name = input(); print \"hi \" + name;", "ann");

        result.expect("program runs");
        assert_eq!(output, "hi ann\n");
    }

    #[test]
    fn file_write_then_read() {
        let path = scratch_file("roundtrip");
        let source = format!(
            "file_write(\"{0}\", \"one\ntwo\"); print file_read(\"{0}\");",
            path.display()
        );

        let output = run(&source);
        let on_disk = fs::read_to_string(&path).expect("file was written");
        let _ = fs::remove_file(&path);

        assert_eq!(on_disk, "one\ntwo");
        // Every line read back ends in a newline; print adds one more.
        assert_eq!(output, "one\ntwo\n\n");
    }

    #[test]
    fn file_write_stringifies_non_string_content() {
        let path = scratch_file("number");
        let source = format!("file_write(\"{}\", 42);", path.display());

        run(&source);
        let on_disk = fs::read_to_string(&path).expect("file was written");
        let _ = fs::remove_file(&path);

        assert_eq!(on_disk, "42");
    }

    #[test]
    fn file_read_of_missing_file_is_a_runtime_error() {
        let path = scratch_file("missing");
        let _ = fs::remove_file(&path);

        let message = run_err(&format!("file_read(\"{}\");", path.display()));

        assert!(message.starts_with("Could not read file"), "{}", message);
        assert!(message.ends_with("\n[line 1]"), "{}", message);
    }

    #[test]
    fn file_paths_must_be_strings() {
        assert_eq!(
            run_err("file_read(1);"),
            "File path must be a string, got number.\n[line 1]"
        );
    }
}
