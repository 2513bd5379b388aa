use lazy_static::lazy_static;
use regex::Regex;
use std::io::Write;

lazy_static! {
    static ref REDACTION_REGEX: Regex = Regex::new(
        r"(?i)(key=[A-Za-z0-9_\-]+|AIza[0-9A-Za-z_\-]{20,}|Bearer\s+[^\s]+|x-goog-api-key:\s*[^\s]+)"
    ).expect("Invalid redaction regex");
}

/// Masks API credentials before they hit a log sink. reqwest errors embed the
/// full request URL, and the Gemini key travels as a query parameter.
pub fn redact(input: &str) -> std::borrow::Cow<'_, str> {
    REDACTION_REGEX.replace_all(input, "[REDACTED]")
}

pub struct RedactingWriter<W: Write> {
    inner: W,
}

impl<W: Write> RedactingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let input = String::from_utf8_lossy(buf);
        self.inner.write_all(redact(&input).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
