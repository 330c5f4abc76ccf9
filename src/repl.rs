use std::io::{self, BufRead, Write};

use miette::Report;

use crate::{Interpreter, parse};

/// Reads one line at a time, evaluating each against the same global scope,
/// until `exit` or end of input.
pub fn start(input: impl BufRead, mut output: impl Write, prompt: &str) -> io::Result<()> {
    let interpreter = Interpreter::new();

    write!(output, "{prompt}")?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        if line.trim() == "exit" {
            break;
        }

        let (program, errors) = parse(&line);
        if !errors.is_empty() {
            writeln!(output, "Parsing failed:")?;
            for error in errors {
                let report = Report::new(error).with_source_code(line.clone());
                writeln!(output, "{report:?}")?;
            }
        } else {
            match interpreter.eval(&program) {
                Ok(value) if value.is_null() => {}
                Ok(value) => writeln!(output, "{value}")?,
                Err(error) => {
                    let report = Report::new(error).with_source_code(line.clone());
                    writeln!(output, "{report:?}")?;
                }
            }
        }

        write!(output, "{prompt}")?;
        output.flush()?;
    }

    Ok(())
}
