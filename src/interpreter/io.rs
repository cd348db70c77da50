//! Console plumbing between the execution core and its callers.

/// Receives program output. `scrie` items arrive as text chunks and each
/// statement ends with a forced line break.
pub trait OutputSink {
    fn text(&mut self, text: &str);
    fn line_break(&mut self);
}

/// Supplies the raw text typed for a `citeste` variable. `None` means no
/// more input is available.
pub trait InputSource {
    fn read(&mut self, name: &str) -> Option<String>;
}

impl<F> InputSource for F
where
    F: FnMut(&str) -> Option<String>,
{
    fn read(&mut self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Buffers chunks until a line break, collecting finished lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    lines: Vec<String>,
    current: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Joins all lines, flushing a trailing partial line if there is one.
    pub fn finish(mut self) -> String {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
        self.lines.join("\n")
    }
}

impl OutputSink for LineBuffer {
    fn text(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn line_break(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
    }
}

/// Whole-text numeric parse used by the batch evaluator.
pub(crate) fn parse_strict(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (unsigned, None),
    };
    let digits = mantissa.replacen('.', "", 1);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    if let Some(exponent) = exponent {
        let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        if exponent.is_empty() || !exponent.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
    }
    trimmed.parse().ok()
}

/// Longest numeric prefix, falling back to 0. Used by the debugger, which
/// never rejects input.
pub(crate) fn parse_lenient(raw: &str) -> f64 {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let mut seen_digit = false;
    let mut seen_point = false;
    let mut valid_end = 0;
    while let Some(&byte) = bytes.get(end) {
        match byte {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
                valid_end = end;
            }
            b'.' if !seen_point => {
                seen_point = true;
                end += 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return 0.0;
    }
    trimmed[..valid_end]
        .parse::<f64>()
        .ok()
        .filter(|value| !value.is_nan())
        .unwrap_or(0.0)
}
