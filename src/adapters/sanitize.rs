//! Log sanitization for patient data.
//!
//! The triage pipeline never logs raw measurements, but formatted errors and
//! third-party messages can still carry them. Every formatted log line passes
//! through [`SanitizingMakeWriter`], which redacts:
//! - Clinical feature values (`age=55`, `"chol": 240`, `thal: 2`)
//! - Patient identifiers (UUIDs, MRNs, SSN-like numbers)
//! - Contact details (emails, phone numbers)
//!
//! Input longer than `CARDIOTRIAGE_SANITIZE_MAX_BYTES` (default 16 KiB) is
//! truncated before scanning.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

use crate::domain::FEATURE_NAMES;

static PATTERNS: OnceLock<Option<RedactionRules>> = OnceLock::new();

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Rule {
    regex: Regex,
    replacement: String,
}

struct RedactionRules {
    set: RegexSet,
    rules: Vec<Rule>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("CARDIOTRIAGE_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn rule_sources() -> Vec<(String, String)> {
    // `name=value`, `name: value` and `"name": value`, keeping the name.
    let features = FEATURE_NAMES.join("|");
    vec![
        (
            format!(r#"(?i)\b(?P<name>{features})(?P<sep>"?\s*[:=]\s*)-?\d+(?:\.\d+)?"#),
            "${name}${sep}[REDACTED]".to_string(),
        ),
        (
            r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}".into(),
            "[REDACTED-UUID]".into(),
        ),
        (r"\b\d{3}-\d{2}-\d{4}\b".into(), "[REDACTED-SSN]".into()),
        (r"\bMRN[:\s]?\d{6,10}\b".into(), "[REDACTED-MRN]".into()),
        (
            r"(?i)\b[a-z0-9][a-z0-9._%+-]{0,63}@(?:[a-z0-9-]{1,63}\.)+[a-z]{2,}\b".into(),
            "[REDACTED-EMAIL]".into(),
        ),
        (
            r"\b(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s][0-9]{3}[-.\s][0-9]{4}\b".into(),
            "[REDACTED-PHONE]".into(),
        ),
    ]
}

fn compile() -> Result<RedactionRules, regex::Error> {
    let sources = rule_sources();
    let set = RegexSet::new(sources.iter().map(|(p, _)| p.as_str()))?;
    let rules = sources
        .into_iter()
        .map(|(pattern, replacement)| {
            Ok(Rule {
                regex: Regex::new(&pattern)?,
                replacement,
            })
        })
        .collect::<Result<Vec<_>, regex::Error>>()?;
    Ok(RedactionRules { set, rules })
}

fn rules() -> Option<&'static RedactionRules> {
    PATTERNS
        .get_or_init(|| match compile() {
            Ok(rules) => Some(rules),
            Err(e) => {
                eprintln!("log sanitizer disabled: {e}");
                None
            }
        })
        .as_ref()
}

/// Redact patient data from a string.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = match rules() {
        Some(rules) if rules.set.is_match(prefix) => {
            let mut out = prefix.to_string();
            for idx in rules.set.matches(prefix).into_iter() {
                let rule = &rules.rules[idx];
                out = rule
                    .regex
                    .replace_all(&out, rule.replacement.as_str())
                    .into_owned();
            }
            out
        }
        // Without compiled rules nothing can be trusted through.
        None => String::from("[REDACTED-UNSANITIZED]"),
        Some(_) => prefix.to_string(),
    };

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// A `tracing_subscriber` writer wrapper that sanitizes each formatted line
/// before it reaches the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&text).as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A formatter writing one huge line must not buffer without bound.
        if self.buffer.len() > max_sanitize_bytes().saturating_mul(2) {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_feature_values_redacted_keeping_names() {
        let sanitized = sanitize("rejected record age=57 chol: 286 oldpeak=2.5");
        assert!(sanitized.contains("age=[REDACTED]"));
        assert!(sanitized.contains("chol: [REDACTED]"));
        assert!(sanitized.contains("oldpeak=[REDACTED]"));
        assert!(!sanitized.contains("286"));
        assert!(!sanitized.contains("2.5"));
    }

    #[test]
    fn test_json_feature_values_redacted() {
        let sanitized = sanitize(r#"{"trestbps": 145, "thalach":150}"#);
        assert!(!sanitized.contains("145"));
        assert!(!sanitized.contains("150"));
        assert!(sanitized.contains("trestbps"));
    }

    #[test]
    fn test_identifiers_redacted() {
        let sanitized =
            sanitize("patient 550e8400-e29b-41d4-a716-446655440000 MRN:12345678 ssn 123-45-6789");
        assert!(sanitized.contains("[REDACTED-UUID]"));
        assert!(sanitized.contains("[REDACTED-MRN]"));
        assert!(sanitized.contains("[REDACTED-SSN]"));
    }

    #[test]
    fn test_email_redacted() {
        let sanitized = sanitize("Contact: patient@hospital.org");
        assert!(sanitized.contains("[REDACTED-EMAIL]"));
    }

    #[test]
    fn test_ordinary_lines_untouched() {
        let line = "Triage complete label=HIGH RISK margin=0.42";
        assert_eq!(sanitize(line), line);
        assert_eq!(sanitize("age=61"), "age=[REDACTED]");
    }

    #[test]
    fn test_truncates_large_inputs() {
        let sanitized = sanitize_with_limit("prefix é suffix with more text", 8);
        assert!(sanitized.ends_with("[TRUNCATED]"));
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut out = Vec::new();
        {
            let mut writer = SanitizingWriter::new(&mut out);
            writer.write_all(b"first age=4").expect("write");
            writer.write_all(b"4\nsecond line\n").expect("write");
            writer.flush().expect("flush");
        }
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "first age=[REDACTED]\nsecond line\n");
    }
}
