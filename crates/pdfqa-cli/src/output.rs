use std::io::{Cursor, Read, Stderr, Stdin, Stdout, Write};

use pdfqa_lib::qa::QaResponse;
use pdfqa_lib::transcript::ChatTurn;

/// Abstracts stdin/stdout/stderr for dependency injection and testability.
pub trait ConsoleIO<IN: Read, OUT: Write, ERR: Write> {
    fn stdin(&mut self) -> &mut IN;
    fn stdout(&mut self) -> &mut OUT;
    fn stderr(&mut self) -> &mut ERR;
}

/// Process stdin/stdout/stderr.
pub struct StdIO {
    stdin: Stdin,
    stdout: Stdout,
    stderr: Stderr,
}

impl StdIO {
    pub fn new() -> Self {
        Self {
            stdin: std::io::stdin(),
            stdout: std::io::stdout(),
            stderr: std::io::stderr(),
        }
    }
}

impl Default for StdIO {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleIO<Stdin, Stdout, Stderr> for StdIO {
    fn stdin(&mut self) -> &mut Stdin {
        &mut self.stdin
    }

    fn stdout(&mut self) -> &mut Stdout {
        &mut self.stdout
    }

    fn stderr(&mut self) -> &mut Stderr {
        &mut self.stderr
    }
}

/// Captured output and canned stdin for tests.
#[derive(Default)]
pub struct BufferedIO {
    stdin: Cursor<Vec<u8>>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl BufferedIO {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stdin(data: &str) -> Self {
        Self {
            stdin: Cursor::new(data.as_bytes().to_vec()),
            ..Self::default()
        }
    }

    pub fn stdout_to_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_to_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

impl ConsoleIO<Cursor<Vec<u8>>, Vec<u8>, Vec<u8>> for BufferedIO {
    fn stdin(&mut self) -> &mut Cursor<Vec<u8>> {
        &mut self.stdin
    }

    fn stdout(&mut self) -> &mut Vec<u8> {
        &mut self.stdout
    }

    fn stderr(&mut self) -> &mut Vec<u8> {
        &mut self.stderr
    }
}

/// Read one line without the trailing newline. `None` at end of input.
///
/// Reads byte by byte so no input past the newline is consumed.
pub fn read_line(input: &mut impl Read) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte)? {
            0 if buf.is_empty() => return Ok(None),
            0 => break,
            _ if byte[0] == b'\n' => break,
            _ => buf.push(byte[0]),
        }
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Print an answer followed by its `Sources:` block.
pub fn write_answer(out: &mut impl Write, answer: &str, sources: &[String]) -> std::io::Result<()> {
    writeln!(out, "{answer}")?;
    if !sources.is_empty() {
        writeln!(out)?;
        writeln!(out, "Sources:")?;
        for source in sources {
            writeln!(out, "  - {source}")?;
        }
    }
    Ok(())
}

pub fn write_response(out: &mut impl Write, response: &QaResponse) -> std::io::Result<()> {
    write_answer(out, &response.answer, &response.sources)
}

/// Print every turn as a numbered Q/A pair.
pub fn write_transcript(out: &mut impl Write, turns: &[ChatTurn]) -> std::io::Result<()> {
    if turns.is_empty() {
        writeln!(out, "No questions asked yet.")?;
        return Ok(());
    }
    for (i, turn) in turns.iter().enumerate() {
        writeln!(out, "[{}] Q: {}", i + 1, turn.user_query)?;
        writeln!(out, "    A: {}", turn.answer.replace('\n', "\n       "))?;
        if !turn.source_citations.is_empty() {
            writeln!(out, "    Sources: {}", turn.source_citations.join("; "))?;
        }
    }
    Ok(())
}
