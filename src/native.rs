//! Host functions installed into the global scope at start‑up.
//!
//! | name         | arity    | result                                  |
//! |--------------|----------|-----------------------------------------|
//! | `clock`      | 0        | wall‑clock seconds since the Unix epoch |
//! | `printf`     | variadic | `nil`; writes the formatted text        |
//! | `input`      | 0        | one line of input, or `nil` at EOF      |
//! | `file_read`  | 1        | whole file as text                      |
//! | `file_write` | 2        | `nil`; overwrites the file              |
//!
//! `printf` placeholders are `{}`, not C's `%d`/`%s`.  Each `{}` takes the
//! next argument in its `print` form and `{{`/`}}` give literal braces, so
//! `printf("{} + {} = {}", 1, 2, 3)` writes `1 + 2 = 3` with no newline.

use std::fs;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::value::{Arity, NativeFn, NativeFunction, Value};

const NATIVES: &[(&str, Arity, NativeFn)] = &[
    ("clock", Arity::Fixed(0), clock),
    ("printf", Arity::Variadic, printf),
    ("input", Arity::Fixed(0), input),
    ("file_read", Arity::Fixed(1), file_read),
    ("file_write", Arity::Fixed(2), file_write),
];

/// Define every native function in `globals`.
pub fn install(globals: &mut Environment) {
    for &(name, arity, func) in NATIVES {
        debug!("Defining native function '{}'", name);

        globals.define(
            name,
            Value::NativeFunction(Rc::new(NativeFunction { name, arity, func })),
        );
    }

    info!("Installed {} native function(s)", NATIVES.len());
}

fn clock(_interpreter: &mut Interpreter, _args: &[Value]) -> Result<Value, String> {
    let micros: i64 = Utc::now().timestamp_micros();

    Ok(Value::Number(micros as f64 / 1_000_000.0))
}

fn printf(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    let (format, rest) = match args.split_first() {
        Some((Value::String(format), rest)) => (format, rest),
        Some((other, _)) => {
            return Err(format!(
                "printf format must be a string, got {}.",
                other.type_name()
            ))
        }
        None => return Err("printf expects a format string.".to_string()),
    };

    let text: String = render(format, rest)?;

    let out = interpreter.output();
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|e| format!("printf failed to write: {}.", e))?;

    Ok(Value::Nil)
}

/// Substitute each `{}` in `format` with the next argument.
/// `{{` and `}}` stand for literal braces.
fn render(format: &str, args: &[Value]) -> Result<String, String> {
    let mut text = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                text.push(c);
            }

            ('{', Some('}')) => {
                chars.next();
                match args.next() {
                    Some(arg) => text.push_str(&arg.to_string()),
                    None => return Err("Not enough arguments for printf format.".to_string()),
                }
            }

            _ => text.push(c),
        }
    }

    if args.next().is_some() {
        return Err("Too many arguments for printf format.".to_string());
    }

    Ok(text)
}

fn input(interpreter: &mut Interpreter, _args: &[Value]) -> Result<Value, String> {
    let mut line = String::new();

    let read: usize = interpreter
        .input()
        .read_line(&mut line)
        .map_err(|e| format!("Could not read input: {}.", e))?;

    if read == 0 {
        return Ok(Value::Nil);
    }

    let trimmed: &str = line.strip_suffix('\n').unwrap_or(&line);
    let trimmed: &str = trimmed.strip_suffix('\r').unwrap_or(trimmed);

    Ok(Value::from(trimmed))
}

fn file_read(_interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    let path: &str = path_arg(&args[0])?;

    let contents: String =
        fs::read_to_string(path).map_err(|e| format!("Could not read file '{}': {}.", path, e))?;

    // Every line, the last included, comes back terminated by "\n".
    let normalized: String = contents.lines().map(|line| format!("{}\n", line)).collect();

    Ok(Value::from(normalized))
}

fn file_write(_interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    let path: &str = path_arg(&args[0])?;
    let content: String = args[1].to_string();

    fs::write(path, content).map_err(|e| format!("Could not write file '{}': {}.", path, e))?;

    Ok(Value::Nil)
}

fn path_arg(value: &Value) -> Result<&str, String> {
    match value {
        Value::String(path) => Ok(&**path),
        other => Err(format!("File path must be a string, got {}.", other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_placeholders_in_order() {
        let args = [Value::Number(1.0), Value::from("two")];

        assert_eq!(render("{} and {}", &args), Ok("1 and two".to_string()));
    }

    #[test]
    fn render_keeps_escaped_braces() {
        assert_eq!(render("{{}}", &[]), Ok("{}".to_string()));
    }

    #[test]
    fn render_rejects_argument_mismatch() {
        assert!(render("{}", &[]).is_err());
        assert!(render("none", &[Value::Nil]).is_err());
    }
}
