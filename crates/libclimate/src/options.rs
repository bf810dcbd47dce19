//! Per-call configuration: behavioral flags, output stream and exit strategy.
//!
//! Every entry point takes a [`CallOptions`]. It can be built with named
//! setters, or resolved from a positional list of [`CallOption`]s, where the
//! first stream and the first exit strategy win, flags are OR-ed together, and
//! entries that mean nothing to the operation at hand are ignored.

use crate::exiter::{Exiter, ProcessExiter};
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

bitflags::bitflags! {
    /// Flags understood by [`crate::Climate::init`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InitFlags: u32 {
        /// Panic, rather than return, if the initializer fails.
        const PANIC_ON_FAILURE = 1 << 0;
        /// Do not add the built-in `--help` flag.
        const NO_HELP_FLAG = 1 << 1;
        /// Do not add the built-in `--version` flag.
        const NO_VERSION_FLAG = 1 << 2;
    }
}

bitflags::bitflags! {
    /// Flags understood by [`crate::Climate::parse`] and [`crate::Parsed::verify`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ParseFlags: u32 {
        /// Panic, rather than return, if parsing fails.
        const PANIC_ON_FAILURE = 1 << 0;
        /// Skip the unrecognised flag/option check in `verify`.
        const DONT_CHECK_UNUSED = 1 << 1;
    }
}

/// Shared, cloneable handle to a writer that diagnostics and usage go to.
#[derive(Clone)]
pub struct OutputStream(Arc<Mutex<dyn Write + Send>>);

impl OutputStream {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self(Arc::new(Mutex::new(writer)))
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Write `text` in one piece and flush.
    pub fn write_str(&self, text: &str) -> io::Result<()> {
        let mut writer = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }
}

impl fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OutputStream(..)")
    }
}

/// In-memory writer whose contents can be read back.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// An [`OutputStream`] writing into this buffer.
    pub fn stream(&self) -> OutputStream {
        OutputStream::new(self.clone())
    }

    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One positionally-passed configuration value.
#[derive(Debug, Clone)]
pub enum CallOption {
    InitFlags(InitFlags),
    ParseFlags(ParseFlags),
    Stream(OutputStream),
    Exiter(Arc<dyn Exiter>),
}

impl From<InitFlags> for CallOption {
    fn from(flags: InitFlags) -> Self {
        Self::InitFlags(flags)
    }
}

impl From<ParseFlags> for CallOption {
    fn from(flags: ParseFlags) -> Self {
        Self::ParseFlags(flags)
    }
}

impl From<OutputStream> for CallOption {
    fn from(stream: OutputStream) -> Self {
        Self::Stream(stream)
    }
}

impl From<Arc<dyn Exiter>> for CallOption {
    fn from(exiter: Arc<dyn Exiter>) -> Self {
        Self::Exiter(exiter)
    }
}

/// Resolved per-call configuration. Unset fields fall back to the registry's
/// defaults, then to stderr and [`ProcessExiter`].
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub init_flags: InitFlags,
    pub parse_flags: ParseFlags,
    pub stream: Option<OutputStream>,
    pub exiter: Option<Arc<dyn Exiter>>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a positional list: flags accumulate, first stream/exiter wins.
    pub fn resolve<I>(options: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CallOption>,
    {
        let mut resolved = Self::default();
        for option in options {
            match option.into() {
                CallOption::InitFlags(flags) => resolved.init_flags |= flags,
                CallOption::ParseFlags(flags) => resolved.parse_flags |= flags,
                CallOption::Stream(stream) => {
                    if resolved.stream.is_none() {
                        resolved.stream = Some(stream);
                    }
                }
                CallOption::Exiter(exiter) => {
                    if resolved.exiter.is_none() {
                        resolved.exiter = Some(exiter);
                    }
                }
            }
        }
        resolved
    }

    pub fn with_init_flags(mut self, flags: InitFlags) -> Self {
        self.init_flags |= flags;
        self
    }

    pub fn with_parse_flags(mut self, flags: ParseFlags) -> Self {
        self.parse_flags |= flags;
        self
    }

    pub fn with_stream(mut self, stream: OutputStream) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_exiter(mut self, exiter: Arc<dyn Exiter>) -> Self {
        self.exiter = Some(exiter);
        self
    }

    pub(crate) fn stream_or(&self, fallback: Option<&OutputStream>) -> OutputStream {
        self.stream
            .clone()
            .or_else(|| fallback.cloned())
            .unwrap_or_else(OutputStream::stderr)
    }

    pub(crate) fn exiter_or(&self, fallback: Option<&Arc<dyn Exiter>>) -> Arc<dyn Exiter> {
        self.exiter
            .clone()
            .or_else(|| fallback.cloned())
            .unwrap_or_else(|| Arc::new(ProcessExiter))
    }
}

impl FromIterator<CallOption> for CallOptions {
    fn from_iter<I: IntoIterator<Item = CallOption>>(iter: I) -> Self {
        Self::resolve(iter)
    }
}
