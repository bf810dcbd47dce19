//! The parse pipeline: engine → built-in help/version → callback dispatch.

use crate::climate::{Climate, ValuesConstraint};
use crate::error::Result;
use crate::exiter::Exiter;
use crate::options::{CallOptions, OutputStream, ParseFlags};
use climate_clasp::{Argument, Arguments, Callback, HELP_FLAG_NAME, VERSION_FLAG_NAME, usage};
use std::sync::Arc;

/// The outcome of one [`Climate::parse`] call.
///
/// Carries the parsed arguments plus the stream, exit strategy and flags that
/// were in force, so [`Parsed::verify`] reports the same way the parse did.
#[derive(Debug)]
pub struct Parsed {
    pub(crate) arguments: Arguments,
    pub(crate) argv: Vec<String>,
    pub(crate) program_name: String,
    pub(crate) parse_flags: ParseFlags,
    pub(crate) stream: OutputStream,
    pub(crate) exiter: Arc<dyn Exiter>,
    pub(crate) value_names: Vec<String>,
    pub(crate) values_constraint: ValuesConstraint,
}

impl Parsed {
    pub fn flags(&self) -> &[Argument] {
        self.arguments.flags()
    }

    pub fn options(&self) -> &[Argument] {
        self.arguments.options()
    }

    pub fn values(&self) -> &[Argument] {
        self.arguments.values()
    }

    /// The registry's program name if one was set, else the base name of `argv[0]`.
    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn parse_flags(&self) -> ParseFlags {
        self.parse_flags
    }

    pub fn stream(&self) -> &OutputStream {
        &self.stream
    }

    pub fn exiter(&self) -> &Arc<dyn Exiter> {
        &self.exiter
    }

    /// Whether the flag was given; counts as handling it.
    pub fn flag_is_specified(&self, name: &str) -> bool {
        self.arguments.flag_is_specified(name)
    }

    /// Find a flag by canonical or given name; counts as handling it.
    pub fn lookup_flag(&self, name: &str) -> Option<&Argument> {
        self.arguments.lookup_flag(name)
    }

    /// Find an option by canonical or given name; counts as handling it.
    pub fn lookup_option(&self, name: &str) -> Option<&Argument> {
        self.arguments.lookup_option(name)
    }

    pub(crate) fn unused_flags_and_options(&self) -> Vec<&Argument> {
        self.arguments.unused_flags_and_options()
    }
}

impl Climate {
    /// Parse `argv` (program path first) against the declared specifications.
    ///
    /// `--help`/`--version`, when declared and given, are rendered to the stream
    /// followed by `exit(0)`. With a returning exit strategy processing carries
    /// on: callbacks are still dispatched and a [`Parsed`] is returned.
    ///
    /// # Panics
    ///
    /// If the engine rejects the input and [`ParseFlags::PANIC_ON_FAILURE`] is set.
    pub fn parse<S: AsRef<str>>(&self, argv: &[S], options: &CallOptions) -> Result<Parsed> {
        let parse_flags = options.parse_flags;
        let stream = options.stream_or(self.stream());
        let exiter = options.exiter_or(self.exiter());

        let argv: Vec<String> = argv.iter().map(|a| a.as_ref().to_string()).collect();
        let arguments = match climate_clasp::parse(&argv, self.specifications()) {
            Ok(arguments) => arguments,
            Err(err) => {
                if parse_flags.contains(ParseFlags::PANIC_ON_FAILURE) {
                    panic!("{}: {err}", self.program_name());
                }
                return Err(err.into());
            }
        };
        tracing::debug!(
            flags = arguments.flags().len(),
            options = arguments.options().len(),
            values = arguments.values().len(),
            "parsed command line"
        );

        let program_name = self.name_for(arguments.program_name()).to_string();
        let params = self.usage_params(&program_name);

        if self.has_specification(HELP_FLAG_NAME) && arguments.flag_is_specified(HELP_FLAG_NAME) {
            tracing::debug!("showing usage");
            stream.write_str(&usage::usage(self.specifications(), &params))?;
            exiter.exit(0);
        }

        if self.has_specification(VERSION_FLAG_NAME)
            && arguments.flag_is_specified(VERSION_FLAG_NAME)
        {
            tracing::debug!("showing version");
            stream.write_str(&usage::version(&params))?;
            exiter.exit(0);
        }

        self.dispatch(&arguments);

        Ok(Parsed {
            arguments,
            argv,
            program_name,
            parse_flags,
            stream,
            exiter,
            value_names: self.value_names().to_vec(),
            values_constraint: self.values_constraint(),
        })
    }

    /// [`Climate::parse`] followed by [`Parsed::verify`] with the same options.
    pub fn parse_and_verify<S: AsRef<str>>(
        &self,
        argv: &[S],
        options: &CallOptions,
    ) -> Result<Parsed> {
        let parsed = self.parse(argv, options)?;
        parsed.verify(options);
        Ok(parsed)
    }

    // Run bound callbacks in argv order; each one handles its argument.
    fn dispatch(&self, arguments: &Arguments) {
        for argument in arguments.flags_and_options() {
            let Some(spec) = argument
                .specification
                .and_then(|idx| self.specifications().get(idx))
            else {
                continue;
            };

            match &spec.callback {
                Callback::None => continue,
                Callback::Flag(f) => f(),
                Callback::Option(f) => f(argument, spec),
            }
            tracing::debug!(name = %argument.resolved_name, "dispatched callback");
            argument.mark_used();
        }
    }
}
