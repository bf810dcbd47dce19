//! The specification registry and its initialization.

use crate::error::{Error, Result};
use crate::exiter::Exiter;
use crate::options::{CallOptions, InitFlags, OutputStream};
use climate_clasp::{
    Argument, Callback, Specification, UsageParams, Version, help_flag, version_flag,
};
use std::sync::Arc;

/// How many positional values a command line must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValuesConstraint {
    #[default]
    Unconstrained,
    /// Exactly `n` values.
    Count(i64),
    /// Between `min` and `max` values; a negative `max` means unbounded.
    Range(i64, i64),
}

impl TryFrom<&[i64]> for ValuesConstraint {
    type Error = Error;

    fn try_from(counts: &[i64]) -> Result<Self> {
        match counts {
            [] => Ok(Self::Unconstrained),
            [n] => Ok(Self::Count(*n)),
            [min, max] => Ok(Self::Range(*min, *max)),
            _ => Err(Error::InvalidConstraint(counts.len())),
        }
    }
}

/// The mutable form of a [`Climate`], handed to the initializer.
#[derive(Debug)]
pub struct ClimateBuilder {
    specifications: Vec<Specification>,
    flags: InitFlags,

    pub version: Option<Version>,
    pub version_prefix: String,
    /// Lines shown above the usage; `:version:` expands to the version line.
    pub info_lines: Vec<String>,
    /// Replaces the base name of `argv[0]` in usage, version and diagnostics.
    pub program_name: Option<String>,
    /// Shown in place of `[ ... flags and options ... ]` on the usage line.
    pub flags_and_options: String,
    /// How the positional values are shown in usage, e.g. `<path-1> <path-2>`.
    pub values_string: String,
    /// Names of the positional values, used when one is missing.
    pub value_names: Vec<String>,
    pub values_constraint: ValuesConstraint,
    /// Suffix policy for [`Climate::abort`]: empty, `:`, punctuation-led, or text.
    pub usage_help_suffix: String,
    pub stream: Option<OutputStream>,
    pub exiter: Option<Arc<dyn Exiter>>,
}

impl ClimateBuilder {
    fn new(flags: InitFlags) -> Self {
        let mut specifications = Vec::new();
        if !flags.contains(InitFlags::NO_HELP_FLAG) {
            specifications.push(help_flag());
        }
        if !flags.contains(InitFlags::NO_VERSION_FLAG) {
            specifications.push(version_flag());
        }

        Self {
            specifications,
            flags,
            version: None,
            version_prefix: String::new(),
            info_lines: Vec::new(),
            program_name: None,
            flags_and_options: String::new(),
            values_string: String::new(),
            value_names: Vec::new(),
            values_constraint: ValuesConstraint::Unconstrained,
            usage_help_suffix: String::new(),
            stream: None,
            exiter: None,
        }
    }

    pub fn flags(&self) -> InitFlags {
        self.flags
    }

    pub fn specifications(&self) -> &[Specification] {
        &self.specifications
    }

    pub fn set_version(&mut self, version: impl Into<Version>) -> &mut Self {
        self.version = Some(version.into());
        self
    }

    pub fn add_flag(&mut self, flag: Specification) -> &mut Self {
        self.insert(flag)
    }

    pub fn add_option(&mut self, option: Specification) -> &mut Self {
        self.insert(option)
    }

    /// `alias` on the command line means `resolved_name`, which may carry a
    /// fixed value (`add_alias("--verbosity=chatty", "-c")`).
    pub fn add_alias(
        &mut self,
        resolved_name: impl Into<String>,
        alias: impl Into<String>,
    ) -> &mut Self {
        self.insert(Specification::alias(resolved_name, alias))
    }

    /// Add `flag`, calling `f` whenever it is matched.
    pub fn add_flag_func<F>(&mut self, flag: Specification, f: F) -> &mut Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.insert(flag.with_callback(Callback::Flag(Arc::new(f))))
    }

    /// Add `option`, calling `f` with the matched argument whenever it is matched.
    pub fn add_option_func<F>(&mut self, option: Specification, f: F) -> &mut Self
    where
        F: Fn(&Argument, &Specification) + Send + Sync + 'static,
    {
        self.insert(option.with_callback(Callback::Option(Arc::new(f))))
    }

    // A flag/option named like an existing one replaces it in place.
    fn insert(&mut self, spec: Specification) -> &mut Self {
        if !spec.is_alias() {
            if let Some(idx) = self
                .specifications
                .iter()
                .position(|s| !s.is_alias() && s.name == spec.name)
            {
                self.specifications[idx] = spec;
                return self;
            }
        }
        self.specifications.push(spec);
        self
    }

    fn build(self) -> Climate {
        Climate {
            specifications: self.specifications,
            flags: self.flags,
            version: self.version,
            version_prefix: self.version_prefix,
            info_lines: self.info_lines,
            program_name: self.program_name,
            process_name: default_program_name(),
            flags_and_options: self.flags_and_options,
            values_string: self.values_string,
            value_names: self.value_names,
            values_constraint: self.values_constraint,
            usage_help_suffix: self.usage_help_suffix,
            stream: self.stream,
            exiter: self.exiter,
        }
    }
}

fn default_program_name() -> String {
    std::env::args_os()
        .next()
        .map(|arg0| climate_clasp::program_name(&arg0.to_string_lossy()).to_string())
        .unwrap_or_default()
}

/// A command-line surface, declared once and read-only afterwards.
///
/// Obtained from [`Climate::init`]; shared by reference across any number of
/// [`Climate::parse`] calls.
#[derive(Debug)]
pub struct Climate {
    specifications: Vec<Specification>,
    flags: InitFlags,
    version: Option<Version>,
    version_prefix: String,
    info_lines: Vec<String>,
    program_name: Option<String>,
    process_name: String,
    flags_and_options: String,
    values_string: String,
    value_names: Vec<String>,
    values_constraint: ValuesConstraint,
    usage_help_suffix: String,
    stream: Option<OutputStream>,
    exiter: Option<Arc<dyn Exiter>>,
}

impl Climate {
    /// Build a `Climate`, letting `initializer` declare flags, options and metadata.
    ///
    /// `--help` and `--version` are added first unless suppressed by
    /// [`InitFlags::NO_HELP_FLAG`] / [`InitFlags::NO_VERSION_FLAG`]. A stream or
    /// exit strategy in `options` becomes the registry default, which the
    /// initializer may override.
    ///
    /// # Panics
    ///
    /// If the initializer fails and [`InitFlags::PANIC_ON_FAILURE`] is set.
    pub fn init<F>(initializer: F, options: &CallOptions) -> Result<Self>
    where
        F: FnOnce(&mut ClimateBuilder) -> anyhow::Result<()>,
    {
        let flags = options.init_flags;
        let mut builder = ClimateBuilder::new(flags);
        builder.stream = options.stream.clone();
        builder.exiter = options.exiter.clone();

        if let Err(err) = initializer(&mut builder) {
            if flags.contains(InitFlags::PANIC_ON_FAILURE) {
                let name = builder.program_name.unwrap_or_else(default_program_name);
                panic!("{name}: initialisation failed: {err:#}");
            }
            return Err(Error::Init(err));
        }

        let climate = builder.build();
        tracing::debug!(
            program = climate.program_name(),
            specifications = climate.specifications.len(),
            ?flags,
            "climate initialised"
        );
        Ok(climate)
    }

    pub fn specifications(&self) -> &[Specification] {
        &self.specifications
    }

    /// Whether a flag or option (not an alias) named `name` is declared.
    pub fn has_specification(&self, name: &str) -> bool {
        self.specifications
            .iter()
            .any(|s| !s.is_alias() && s.name == name)
    }

    pub fn flags(&self) -> InitFlags {
        self.flags
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn version_prefix(&self) -> &str {
        &self.version_prefix
    }

    pub fn info_lines(&self) -> &[String] {
        &self.info_lines
    }

    /// The configured program name, or the base name of this process's `argv[0]`.
    pub fn program_name(&self) -> &str {
        self.program_name.as_deref().unwrap_or(&self.process_name)
    }

    pub fn flags_and_options(&self) -> &str {
        &self.flags_and_options
    }

    // Name used for a parse of `argv`: the configured one wins over argv[0].
    pub(crate) fn name_for<'a>(&'a self, argv_name: &'a str) -> &'a str {
        self.program_name.as_deref().unwrap_or(argv_name)
    }

    pub fn values_string(&self) -> &str {
        &self.values_string
    }

    pub fn value_names(&self) -> &[String] {
        &self.value_names
    }

    pub fn values_constraint(&self) -> ValuesConstraint {
        self.values_constraint
    }

    pub fn usage_help_suffix(&self) -> &str {
        &self.usage_help_suffix
    }

    pub fn stream(&self) -> Option<&OutputStream> {
        self.stream.as_ref()
    }

    pub fn exiter(&self) -> Option<&Arc<dyn Exiter>> {
        self.exiter.as_ref()
    }

    pub(crate) fn usage_params<'a>(&'a self, program_name: &'a str) -> UsageParams<'a> {
        UsageParams {
            program_name,
            version: self.version.as_ref(),
            version_prefix: &self.version_prefix,
            info_lines: &self.info_lines,
            values_string: &self.values_string,
            flags_and_options: &self.flags_and_options,
        }
    }
}
