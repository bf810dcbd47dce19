//! Program-name-prefixed diagnostics followed by `exit(1)`.

use crate::climate::Climate;
use crate::exiter::Exiter;
use crate::options::{CallOptions, OutputStream};
use std::borrow::Cow;
use std::fmt;

pub const DEFAULT_USAGE_SUFFIX: &str = "; use --help for usage";

/// Turn a usage-help suffix policy into the text appended to abort lines.
///
/// - `""` => no suffix
/// - `":"` => [`DEFAULT_USAGE_SUFFIX`]
/// - starts with punctuation => used as-is
/// - anything else => prefixed with `"; "`
pub fn usage_suffix(policy: &str) -> Cow<'_, str> {
    match policy {
        "" => Cow::Borrowed(""),
        ":" => Cow::Borrowed(DEFAULT_USAGE_SUFFIX),
        s if s.starts_with(|c: char| c.is_ascii_punctuation()) => Cow::Borrowed(s),
        s => Cow::Owned(format!("; {s}")),
    }
}

/// Write `line` to `stream`, then `exit(1)`.
pub(crate) fn emit(stream: &OutputStream, exiter: &dyn Exiter, line: &str) {
    if let Err(err) = stream.write_str(line) {
        tracing::warn!(error = %err, "failed to write diagnostic");
    }
    exiter.exit(1);
}

impl Climate {
    /// Report an application-level failure and exit with status 1.
    ///
    /// Writes `<program>: <message>[: <err>]<suffix>` where the suffix comes
    /// from the registry's usage-help suffix policy.
    pub fn abort(&self, message: &str, err: Option<&dyn fmt::Display>, options: &CallOptions) {
        let stream = options.stream_or(self.stream());
        let exiter = options.exiter_or(self.exiter());
        let suffix = usage_suffix(self.usage_help_suffix());

        let line = match err {
            Some(err) => format!("{}: {message}: {err}{suffix}\n", self.program_name()),
            None => format!("{}: {message}{suffix}\n", self.program_name()),
        };
        emit(&stream, &*exiter, &line);
    }
}
