use libclimate::{
    ArgumentKind, BitFlagsReceiver, CallOptions, CaptureExiter, Climate, ClimateBuilder, Error,
    ParseFlags, SharedBuffer, Specification, ValuesConstraint,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct Harness {
    buffer: SharedBuffer,
    exiter: Arc<CaptureExiter>,
}

impl Harness {
    fn new() -> Self {
        Self {
            buffer: SharedBuffer::new(),
            exiter: Arc::new(CaptureExiter::new()),
        }
    }

    fn options(&self) -> CallOptions {
        CallOptions::new()
            .with_stream(self.buffer.stream())
            .with_exiter(self.exiter.clone())
    }
}

fn climate<F>(initializer: F) -> Climate
where
    F: FnOnce(&mut ClimateBuilder) -> anyhow::Result<()>,
{
    Climate::init(initializer, &CallOptions::new()).unwrap()
}

#[test]
fn flag_callback_runs_once_and_counts_as_handled() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let climate = climate(move |cl| {
        cl.add_flag_func(Specification::flag("--debug").with_alias("-d"), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        Ok(())
    });
    let h = Harness::new();

    climate.parse_and_verify(&["prog", "-d"], &h.options()).unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(h.buffer.contents(), "");
    assert_eq!(h.exiter.calls(), 0);
}

#[test]
fn option_callback_receives_value() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let climate = climate(move |cl| {
        cl.add_option_func(Specification::option("--level"), move |arg, spec| {
            sink.lock()
                .unwrap()
                .push(format!("{}:{}:{}", spec.name, arg.given_name, arg.value));
        });
        Ok(())
    });
    let h = Harness::new();

    climate
        .parse_and_verify(&["prog", "--level=high", "--level", "low"], &h.options())
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["--level:--level:high", "--level:--level:low"]
    );
    assert_eq!(h.exiter.calls(), 0);
}

#[test]
fn callbacks_run_in_command_line_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let (a, b) = (Arc::clone(&order), Arc::clone(&order));
    let climate = climate(move |cl| {
        cl.add_flag_func(Specification::flag("--first"), move || {
            a.lock().unwrap().push("first");
        });
        cl.add_option_func(Specification::option("--second"), move |_, _| {
            b.lock().unwrap().push("second");
        });
        Ok(())
    });
    let h = Harness::new();

    climate
        .parse_and_verify(&["prog", "--second=x", "--first", "--second=y"], &h.options())
        .unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["second", "first", "second"]);
}

#[test]
fn alias_with_fixed_value_resolves_to_option() {
    let climate = climate(|cl| {
        cl.add_option(Specification::option("--verbosity").with_values(["terse", "chatty"]));
        cl.add_alias("--verbosity=chatty", "-c");
        Ok(())
    });
    let h = Harness::new();

    let parsed = climate.parse(&["prog", "-c"], &h.options()).unwrap();
    let verbosity = parsed.lookup_option("--verbosity").unwrap();

    assert_eq!(verbosity.kind, ArgumentKind::Option);
    assert_eq!(verbosity.given_name, "-c");
    assert_eq!(verbosity.value, "chatty");

    parsed.verify(&CallOptions::new());
    assert_eq!(h.exiter.calls(), 0);
}

#[test]
fn unchecked_recognised_flag_is_reported() {
    let climate = climate(|cl| {
        cl.add_flag(Specification::flag("--debug"));
        Ok(())
    });
    let h = Harness::new();

    climate.parse_and_verify(&["prog", "--debug"], &h.options()).unwrap();

    assert_eq!(h.buffer.contents(), "prog: unrecognised flag/option: --debug\n");
    assert_eq!(h.exiter.exit_code(), Some(1));
}

#[test]
fn looked_up_flag_is_not_reported() {
    let climate = climate(|cl| {
        cl.add_flag(Specification::flag("--debug"));
        Ok(())
    });
    let h = Harness::new();

    let parsed = climate.parse(&["prog", "--debug"], &h.options()).unwrap();
    assert!(parsed.flag_is_specified("--debug"));
    parsed.verify(&CallOptions::new());

    assert_eq!(h.buffer.contents(), "");
    assert_eq!(h.exiter.calls(), 0);
}

#[test]
fn unknown_option_is_reported_with_value() {
    let climate = climate(|_| Ok(()));
    let h = Harness::new();

    climate
        .parse_and_verify(&["prog", "--colour=red"], &h.options())
        .unwrap();

    assert_eq!(
        h.buffer.contents(),
        "prog: unrecognised flag/option: --colour=red\n"
    );
}

#[test]
fn first_unused_argument_is_reported_only() {
    let climate = climate(|_| Ok(()));
    let h = Harness::new();

    climate
        .parse_and_verify(&["prog", "--x", "--y"], &h.options())
        .unwrap();

    assert_eq!(h.buffer.contents(), "prog: unrecognised flag/option: --x\n");
    assert_eq!(h.exiter.calls(), 1);
}

#[test]
fn dont_check_unused_skips_the_check() {
    let climate = climate(|_| Ok(()));
    let h = Harness::new();
    let options = h.options().with_parse_flags(ParseFlags::DONT_CHECK_UNUSED);

    let parsed = climate
        .parse_and_verify(&["prog", "--unknown", "file"], &options)
        .unwrap();

    assert_eq!(parsed.values().len(), 1);
    assert_eq!(h.buffer.contents(), "");
    assert_eq!(h.exiter.calls(), 0);
}

#[test]
fn bit_flags_accumulate_into_receiver() {
    const VERBOSE: u64 = 0x1;
    const DRY_RUN: u64 = 0x4;
    let receiver = BitFlagsReceiver::new();
    let bits = receiver.clone();
    let climate = climate(move |cl| {
        cl.add_flag(Specification::flag("--verbose").with_bit_flags(VERBOSE, &bits));
        cl.add_flag(
            Specification::flag("--dry-run")
                .with_alias("-n")
                .with_bit_flags(DRY_RUN, &bits),
        );
        Ok(())
    });
    let h = Harness::new();

    climate
        .parse_and_verify(&["prog", "--verbose", "-n"], &h.options())
        .unwrap();

    assert_eq!(receiver.get(), VERBOSE | DRY_RUN);
    assert_eq!(h.exiter.calls(), 0);
}

#[test]
fn double_dash_ends_flags() {
    let climate = climate(|_| Ok(()));
    let h = Harness::new();

    let parsed = climate
        .parse_and_verify(&["prog", "--", "--not-a-flag", "-"], &h.options())
        .unwrap();

    let values: Vec<&str> = parsed.values().iter().map(|v| v.value.as_str()).collect();
    assert_eq!(values, vec!["--not-a-flag", "-"]);
    assert!(parsed.flags().is_empty());
    assert_eq!(h.exiter.calls(), 0);
}

#[test]
fn missing_value_uses_placeholder_name() {
    let climate = climate(|cl| {
        cl.values_constraint = ValuesConstraint::Range(2, 4);
        Ok(())
    });
    let h = Harness::new();

    climate
        .parse_and_verify(&["prog", "only-one"], &h.options())
        .unwrap();

    assert_eq!(h.buffer.contents(), "prog: value-1 not specified\n");
    assert_eq!(h.exiter.exit_code(), Some(1));
}

#[test]
fn missing_value_uses_declared_name() {
    let climate = climate(|cl| {
        cl.values_constraint = ValuesConstraint::Count(2);
        cl.value_names = vec!["source".to_string(), "destination".to_string()];
        Ok(())
    });
    let h = Harness::new();

    climate
        .parse_and_verify(&["prog", "a.txt"], &h.options())
        .unwrap();

    assert_eq!(h.buffer.contents(), "prog: destination not specified\n");
}

#[test]
fn values_within_range_pass() {
    let climate = climate(|cl| {
        cl.values_constraint = ValuesConstraint::Range(2, 4);
        Ok(())
    });
    let h = Harness::new();

    climate
        .parse_and_verify(&["prog", "a", "b", "c"], &h.options())
        .unwrap();

    assert_eq!(h.buffer.contents(), "");
    assert_eq!(h.exiter.calls(), 0);
}

#[test]
fn too_many_values() {
    let climate = climate(|cl| {
        cl.values_constraint = ValuesConstraint::Range(2, 2);
        Ok(())
    });
    let h = Harness::new();

    climate
        .parse_and_verify(&["prog", "a", "b", "c"], &h.options())
        .unwrap();

    assert_eq!(h.buffer.contents(), "prog: too many values\n");
    assert_eq!(h.exiter.exit_code(), Some(1));
}

#[test]
fn unused_check_runs_before_values_check() {
    let climate = climate(|cl| {
        cl.values_constraint = ValuesConstraint::Count(1);
        Ok(())
    });
    let h = Harness::new();

    climate
        .parse_and_verify(&["prog", "--bogus"], &h.options())
        .unwrap();

    assert_eq!(h.buffer.contents(), "prog: unrecognised flag/option: --bogus\n");
    assert_eq!(h.exiter.calls(), 1);
}

#[test]
fn verify_options_override_parse_options() {
    let climate = climate(|_| Ok(()));
    let first = Harness::new();
    let second = Harness::new();

    let parsed = climate.parse(&["prog", "--bogus"], &first.options()).unwrap();
    parsed.verify(&second.options());

    assert_eq!(first.buffer.contents(), "");
    assert_eq!(second.buffer.contents(), "prog: unrecognised flag/option: --bogus\n");
    assert_eq!(second.exiter.exit_code(), Some(1));
}

#[test]
fn empty_argv_is_a_parse_error() {
    let climate = climate(|_| Ok(()));
    let argv: [&str; 0] = [];

    let err = climate.parse(&argv, &CallOptions::new()).unwrap_err();

    assert!(matches!(err, Error::Parse(_)), "unexpected error: {err:?}");
}

#[test]
#[should_panic(expected = "argv is empty")]
fn empty_argv_panics_when_asked_to() {
    let climate = climate(|_| Ok(()));
    let argv: [&str; 0] = [];
    let options = CallOptions::new().with_parse_flags(ParseFlags::PANIC_ON_FAILURE);

    let _ = climate.parse(&argv, &options);
}

#[test]
fn conflicting_aliases_are_a_parse_error() {
    let climate = climate(|cl| {
        cl.add_flag(Specification::flag("--debug").with_alias("-d"));
        cl.add_flag(Specification::flag("--dry-run").with_alias("-d"));
        Ok(())
    });

    let err = climate.parse(&["prog"], &CallOptions::new()).unwrap_err();

    assert!(err.to_string().contains("-d"), "unexpected error: {err}");
}

#[test]
fn climate_is_reusable_across_parses() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let climate = climate(move |cl| {
        cl.add_flag_func(Specification::flag("--tick"), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        Ok(())
    });

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let h = Harness::new();
                climate.parse_and_verify(&["prog", "--tick"], &h.options()).unwrap();
                assert_eq!(h.exiter.calls(), 0);
            });
        }
    });

    assert_eq!(hits.load(Ordering::SeqCst), 4);
}

#[test]
fn configured_program_name_wins_over_argv() {
    let climate = climate(|cl| {
        cl.program_name = Some("myapp".to_string());
        Ok(())
    });
    let h = Harness::new();

    let parsed = climate
        .parse_and_verify(&["bin/other", "--bogus"], &h.options())
        .unwrap();
    climate.abort("oops", None, &h.options());

    assert_eq!(parsed.program_name(), "myapp");
    assert_eq!(
        h.buffer.contents(),
        "myapp: unrecognised flag/option: --bogus\nmyapp: oops\n"
    );
}

#[test]
fn configured_program_name_in_value_diagnostics() {
    let climate = climate(|cl| {
        cl.program_name = Some("myapp".to_string());
        cl.values_constraint = ValuesConstraint::Count(1);
        Ok(())
    });
    let h = Harness::new();

    climate
        .parse_and_verify(&["bin/other", "a", "b"], &h.options())
        .unwrap();

    assert_eq!(h.buffer.contents(), "myapp: too many values\n");
}
