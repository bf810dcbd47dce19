//! Flag/option specifications, command-line tokenising and usage rendering.
//!
//! This crate is the parsing engine behind `libclimate`:
//! - `spec` declares flags, options and aliases
//! - `parse` turns `argv` into [`args::Arguments`]
//! - `usage` renders usage and version text for a list of specifications
//!
//! It knows nothing about exit strategies, output streams or diagnostics.

pub mod spec {
    use super::args::Argument;
    use std::fmt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    pub const HELP_FLAG_NAME: &str = "--help";
    pub const VERSION_FLAG_NAME: &str = "--version";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SpecificationKind {
        Flag,
        Option,
        /// Maps an alternate name onto a flag, an option, or a fixed `name=value`.
        Alias,
    }

    pub type FlagCallback = Arc<dyn Fn() + Send + Sync>;
    pub type OptionCallback = Arc<dyn Fn(&Argument, &Specification) + Send + Sync>;

    /// Code bound to a specification, run when a matching argument is parsed.
    #[derive(Clone, Default)]
    pub enum Callback {
        #[default]
        None,
        Flag(FlagCallback),
        Option(OptionCallback),
    }

    impl Callback {
        pub fn is_none(&self) -> bool {
            matches!(self, Self::None)
        }
    }

    impl fmt::Debug for Callback {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::None => f.write_str("None"),
                Self::Flag(_) => f.write_str("Flag(..)"),
                Self::Option(_) => f.write_str("Option(..)"),
            }
        }
    }

    /// Shared receiver that flags carrying bit flags are OR-ed into.
    #[derive(Debug, Clone, Default)]
    pub struct BitFlagsReceiver(Arc<AtomicU64>);

    impl BitFlagsReceiver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }

        pub(crate) fn set(&self, bits: u64) {
            self.0.fetch_or(bits, Ordering::SeqCst);
        }
    }

    /// Declaration of one flag, option or alias.
    ///
    /// Specifications are plain values: whoever registers one keeps a copy, so
    /// later changes to the original are not observed.
    #[derive(Debug, Clone)]
    pub struct Specification {
        pub kind: SpecificationKind,
        pub name: String,
        pub aliases: Vec<String>,
        pub help: String,
        /// Allowed values (options only); used for display.
        pub values: Vec<String>,
        pub bit_flags: Option<(u64, BitFlagsReceiver)>,
        pub callback: Callback,
    }

    impl Specification {
        fn new(kind: SpecificationKind, name: String) -> Self {
            Self {
                kind,
                name,
                aliases: Vec::new(),
                help: String::new(),
                values: Vec::new(),
                bit_flags: None,
                callback: Callback::None,
            }
        }

        pub fn flag(name: impl Into<String>) -> Self {
            Self::new(SpecificationKind::Flag, name.into())
        }

        pub fn option(name: impl Into<String>) -> Self {
            Self::new(SpecificationKind::Option, name.into())
        }

        /// An alias such that `alias` on the command line means `resolved_name`.
        ///
        /// `resolved_name` may carry a fixed value, e.g. `--verbosity=chatty`.
        pub fn alias(resolved_name: impl Into<String>, alias: impl Into<String>) -> Self {
            Self::new(SpecificationKind::Alias, resolved_name.into()).with_alias(alias)
        }

        pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
            self.aliases.push(alias.into());
            self
        }

        pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.aliases.extend(aliases.into_iter().map(Into::into));
            self
        }

        pub fn with_help(mut self, help: impl Into<String>) -> Self {
            self.help = help.into();
            self
        }

        pub fn with_values<I, S>(mut self, values: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.values = values.into_iter().map(Into::into).collect();
            self
        }

        /// When this flag is matched, `bits` is OR-ed into `receiver` and the
        /// argument is marked used.
        pub fn with_bit_flags(mut self, bits: u64, receiver: &BitFlagsReceiver) -> Self {
            self.bit_flags = Some((bits, receiver.clone()));
            self
        }

        pub fn with_callback(mut self, callback: Callback) -> Self {
            self.callback = callback;
            self
        }

        pub fn is_flag(&self) -> bool {
            self.kind == SpecificationKind::Flag
        }

        pub fn is_option(&self) -> bool {
            self.kind == SpecificationKind::Option
        }

        pub fn is_alias(&self) -> bool {
            self.kind == SpecificationKind::Alias
        }
    }

    /// The standard `--help` flag.
    pub fn help_flag() -> Specification {
        Specification::flag(HELP_FLAG_NAME).with_help("Shows this help and exits")
    }

    /// The standard `--version` flag.
    pub fn version_flag() -> Specification {
        Specification::flag(VERSION_FLAG_NAME).with_help("Shows version information and exits")
    }
}

pub mod args {
    use std::cell::Cell;
    use std::fmt;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ArgumentKind {
        Flag,
        Option,
        Value,
    }

    /// One flag, option or value found on the command line.
    #[derive(Debug, Clone)]
    pub struct Argument {
        /// Canonical name after alias resolution (empty for values).
        pub resolved_name: String,
        /// Name as it appeared in argv (empty for values).
        pub given_name: String,
        /// Option value, or the text of a value.
        pub value: String,
        pub kind: ArgumentKind,
        /// Index of the (first) token in argv.
        pub cmd_line_index: usize,
        /// Index of the matching specification, if any.
        pub specification: Option<usize>,
        used: Cell<bool>,
    }

    impl Argument {
        pub(crate) fn new(
            kind: ArgumentKind,
            resolved_name: String,
            given_name: String,
            value: String,
            cmd_line_index: usize,
            specification: Option<usize>,
        ) -> Self {
            Self {
                resolved_name,
                given_name,
                value,
                kind,
                cmd_line_index,
                specification,
                used: Cell::new(false),
            }
        }

        pub fn is_used(&self) -> bool {
            self.used.get()
        }

        /// Marks the argument as handled, so it is not reported as unused.
        pub fn mark_used(&self) {
            self.used.set(true);
        }

        fn matches(&self, name: &str) -> bool {
            self.resolved_name == name || self.given_name == name
        }
    }

    impl fmt::Display for Argument {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self.kind {
                ArgumentKind::Flag => f.write_str(&self.given_name),
                ArgumentKind::Option => write!(f, "{}={}", self.given_name, self.value),
                ArgumentKind::Value => f.write_str(&self.value),
            }
        }
    }

    /// Everything parsed out of one argv.
    #[derive(Debug, Clone, Default)]
    pub struct Arguments {
        flags: Vec<Argument>,
        options: Vec<Argument>,
        values: Vec<Argument>,
        program_name: String,
    }

    impl Arguments {
        pub(crate) fn new(program_name: String) -> Self {
            Self {
                program_name,
                ..Default::default()
            }
        }

        pub(crate) fn push(&mut self, argument: Argument) {
            match argument.kind {
                ArgumentKind::Flag => self.flags.push(argument),
                ArgumentKind::Option => self.options.push(argument),
                ArgumentKind::Value => self.values.push(argument),
            }
        }

        pub fn flags(&self) -> &[Argument] {
            &self.flags
        }

        pub fn options(&self) -> &[Argument] {
            &self.options
        }

        pub fn values(&self) -> &[Argument] {
            &self.values
        }

        pub fn program_name(&self) -> &str {
            &self.program_name
        }

        /// Flags and options together, in argv order.
        pub fn flags_and_options(&self) -> Vec<&Argument> {
            let mut all: Vec<&Argument> = self.flags.iter().chain(self.options.iter()).collect();
            all.sort_by_key(|a| a.cmd_line_index);
            all
        }

        /// Flags and options nobody has looked at, in argv order.
        pub fn unused_flags_and_options(&self) -> Vec<&Argument> {
            self.flags_and_options()
                .into_iter()
                .filter(|a| !a.is_used())
                .collect()
        }

        /// Find a flag by resolved or given name, marking it used.
        pub fn lookup_flag(&self, name: &str) -> Option<&Argument> {
            lookup(&self.flags, name)
        }

        /// Find an option by resolved or given name, marking it used.
        pub fn lookup_option(&self, name: &str) -> Option<&Argument> {
            lookup(&self.options, name)
        }

        /// Whether the flag was given, marking every occurrence used.
        pub fn flag_is_specified(&self, name: &str) -> bool {
            let mut found = false;
            for flag in self.flags.iter().filter(|a| a.matches(name)) {
                flag.mark_used();
                found = true;
            }
            found
        }
    }

    fn lookup<'a>(arguments: &'a [Argument], name: &str) -> Option<&'a Argument> {
        let found = arguments.iter().find(|a| a.matches(name))?;
        found.mark_used();
        Some(found)
    }
}

pub mod parse {
    use super::args::{Argument, ArgumentKind, Arguments};
    use super::spec::{Specification, SpecificationKind};
    use std::collections::HashMap;
    use std::path::Path;

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    pub enum ParseError {
        #[error("argv is empty: no program name")]
        MissingProgramName,
        #[error("specification conflict: {alias} maps to both '{first}' and '{second}'")]
        Conflict {
            alias: String,
            first: String,
            second: String,
        },
    }

    pub type ParseResult<T> = Result<T, ParseError>;

    /// Base name of a program path (`bin/myapp` => `myapp`).
    pub fn program_name(path: &str) -> &str {
        Path::new(path)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(path)
    }

    struct Resolution<'s> {
        name: &'s str,
        value: Option<&'s str>,
        specification: Option<usize>,
    }

    struct SpecIndex<'s> {
        specifications: &'s [Specification],
        names: HashMap<&'s str, usize>,
        aliases: HashMap<&'s str, usize>,
    }

    impl<'s> SpecIndex<'s> {
        fn build(specifications: &'s [Specification]) -> ParseResult<Self> {
            let mut names: HashMap<&str, usize> = HashMap::new();
            let mut aliases: HashMap<&str, usize> = HashMap::new();

            for (idx, spec) in specifications.iter().enumerate() {
                if spec.kind != SpecificationKind::Alias {
                    names.entry(spec.name.as_str()).or_insert(idx);
                }
                for alias in &spec.aliases {
                    if let Some(prev) = aliases.insert(alias.as_str(), idx) {
                        if specifications[prev].name != spec.name {
                            return Err(ParseError::Conflict {
                                alias: alias.clone(),
                                first: specifications[prev].name.clone(),
                                second: spec.name.clone(),
                            });
                        }
                    }
                }
            }

            Ok(Self {
                specifications,
                names,
                aliases,
            })
        }

        fn resolve<'a>(&self, given: &'a str) -> Resolution<'a>
        where
            's: 'a,
        {
            if let Some(&idx) = self.names.get(given) {
                return Resolution {
                    name: given,
                    value: None,
                    specification: Some(idx),
                };
            }

            let Some(&idx) = self.aliases.get(given) else {
                return Resolution {
                    name: given,
                    value: None,
                    specification: None,
                };
            };

            let target = &self.specifications[idx];
            if target.kind != SpecificationKind::Alias && !target.name.contains('=') {
                return Resolution {
                    name: target.name.as_str(),
                    value: None,
                    specification: Some(idx),
                };
            }

            // Pure alias: resolve its target once more.
            let (name, value) = match target.name.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (target.name.as_str(), None),
            };
            Resolution {
                name,
                value,
                specification: self.names.get(name).copied(),
            }
        }
    }

    /// Parse `argv` (including the program path at index 0) against `specifications`.
    ///
    /// - `--` ends flag/option processing; a lone `-` is a value
    /// - `--name=value` is split at the first `=`
    /// - an option without an inline value takes the next token as its value
    /// - unknown flags/options are kept, with no specification
    pub fn parse(argv: &[String], specifications: &[Specification]) -> ParseResult<Arguments> {
        let Some(program) = argv.first() else {
            return Err(ParseError::MissingProgramName);
        };
        let index = SpecIndex::build(specifications)?;
        let mut arguments = Arguments::new(program_name(program).to_string());

        let mut i = 1usize;
        let mut after_separator = false;
        while i < argv.len() {
            let token = argv[i].as_str();

            if !after_separator && token == "--" {
                after_separator = true;
                i += 1;
                continue;
            }

            if after_separator || token == "-" || !token.starts_with('-') {
                arguments.push(Argument::new(
                    ArgumentKind::Value,
                    String::new(),
                    String::new(),
                    token.to_string(),
                    i,
                    None,
                ));
                i += 1;
                continue;
            }

            let (given, inline) = match token.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (token, None),
            };
            let resolution = index.resolve(given);
            let spec = resolution.specification.map(|idx| &specifications[idx]);
            let takes_value = spec.is_some_and(Specification::is_option);

            match inline.or(resolution.value) {
                Some(value) => {
                    arguments.push(Argument::new(
                        ArgumentKind::Option,
                        resolution.name.to_string(),
                        given.to_string(),
                        value.to_string(),
                        i,
                        resolution.specification.filter(|_| takes_value),
                    ));
                    i += 1;
                }
                None if takes_value => {
                    let value = argv.get(i + 1).cloned().unwrap_or_default();
                    arguments.push(Argument::new(
                        ArgumentKind::Option,
                        resolution.name.to_string(),
                        given.to_string(),
                        value,
                        i,
                        resolution.specification,
                    ));
                    i += 2;
                }
                None => {
                    let flag = Argument::new(
                        ArgumentKind::Flag,
                        resolution.name.to_string(),
                        given.to_string(),
                        String::new(),
                        i,
                        resolution.specification,
                    );
                    if let Some((bits, receiver)) = spec.and_then(|s| s.bit_flags.as_ref()) {
                        receiver.set(*bits);
                        flag.mark_used();
                    }
                    arguments.push(flag);
                    i += 1;
                }
            }
        }

        Ok(arguments)
    }
}

pub mod usage {
    use super::spec::{Specification, SpecificationKind};
    use std::fmt;

    pub const VERSION_PLACEHOLDER: &str = ":version:";
    pub const DEFAULT_FLAGS_AND_OPTIONS: &str = "[ ... flags and options ... ]";

    /// A program version: free text, or numeric parts joined with `.`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Version {
        Text(String),
        Parts(Vec<u32>),
    }

    impl fmt::Display for Version {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Text(text) => f.write_str(text),
                Self::Parts(parts) => {
                    for (idx, part) in parts.iter().enumerate() {
                        if idx > 0 {
                            f.write_str(".")?;
                        }
                        write!(f, "{part}")?;
                    }
                    Ok(())
                }
            }
        }
    }

    impl From<&str> for Version {
        fn from(text: &str) -> Self {
            Self::Text(text.to_string())
        }
    }

    impl From<String> for Version {
        fn from(text: String) -> Self {
            Self::Text(text)
        }
    }

    impl From<Vec<u32>> for Version {
        fn from(parts: Vec<u32>) -> Self {
            Self::Parts(parts)
        }
    }

    impl<const N: usize> From<[u32; N]> for Version {
        fn from(parts: [u32; N]) -> Self {
            Self::Parts(parts.to_vec())
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct UsageParams<'a> {
        pub program_name: &'a str,
        pub version: Option<&'a Version>,
        pub version_prefix: &'a str,
        pub info_lines: &'a [String],
        /// Display form of the positional values, e.g. `<path-1> <path-2>`.
        pub values_string: &'a str,
        /// Display form of the flags/options part; defaults to [`DEFAULT_FLAGS_AND_OPTIONS`].
        pub flags_and_options: &'a str,
    }

    fn version_line(params: &UsageParams<'_>) -> String {
        match params.version {
            Some(version) => format!(
                "{} {}{}",
                params.program_name, params.version_prefix, version
            ),
            None => params.program_name.to_string(),
        }
    }

    fn format_spec_left(spec: &Specification) -> String {
        let mut out = String::new();
        for alias in &spec.aliases {
            out.push_str(alias);
            out.push(' ');
        }
        out.push_str(&spec.name);
        if spec.kind == SpecificationKind::Option {
            out.push_str("=<value>");
        }
        out
    }

    /// Render usage text, listing specifications in the order given.
    pub fn usage(specifications: &[Specification], params: &UsageParams<'_>) -> String {
        let mut out = String::new();

        for line in params.info_lines {
            if line == VERSION_PLACEHOLDER {
                out.push_str(&version_line(params));
            } else {
                out.push_str(line);
            }
            out.push('\n');
        }

        let flags_and_options = if params.flags_and_options.is_empty() {
            DEFAULT_FLAGS_AND_OPTIONS
        } else {
            params.flags_and_options
        };
        out.push_str(&format!("USAGE: {} {}", params.program_name, flags_and_options));
        if !params.values_string.trim().is_empty() {
            out.push(' ');
            out.push_str(params.values_string.trim());
        }
        out.push_str("\n\n");

        if specifications.is_empty() {
            return out;
        }

        out.push_str("flags/options:\n\n");
        for spec in specifications {
            out.push_str(&format!("\t{}\n", format_spec_left(spec)));
            if !spec.help.trim().is_empty() {
                out.push_str(&format!("\t\t{}\n", spec.help.trim()));
            }
            if spec.kind == SpecificationKind::Option && !spec.values.is_empty() {
                out.push_str("\t\twhere <value> one of:\n");
                for value in &spec.values {
                    out.push_str(&format!("\t\t\t{value}\n"));
                }
            }
            out.push('\n');
        }

        out
    }

    /// Render the version line, e.g. `myapp v0.1.2\n`.
    pub fn version(params: &UsageParams<'_>) -> String {
        format!("{}\n", version_line(params))
    }
}

pub use args::{Argument, ArgumentKind, Arguments};
pub use parse::{ParseError, ParseResult, parse, program_name};
pub use spec::{
    BitFlagsReceiver, Callback, FlagCallback, HELP_FLAG_NAME, OptionCallback, Specification,
    SpecificationKind, VERSION_FLAG_NAME, help_flag, version_flag,
};
pub use usage::{UsageParams, Version};
