//! Declare a program's command-line surface once, then parse, dispatch,
//! verify and report around it.
//!
//! # Example
//!
//! ```rust,no_run
//! use libclimate::{CallOptions, Climate, ParseFlags, Specification};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! let debug = Arc::new(AtomicBool::new(false));
//! let flag = Arc::clone(&debug);
//!
//! let climate = Climate::init(
//!     |cl| {
//!         cl.set_version([0u32, 1, 2]);
//!         cl.info_lines = vec!["Example program".into(), ":version:".into()];
//!         cl.add_flag_func(
//!             Specification::flag("--debug").with_alias("-d").with_help("runs in Debug mode"),
//!             move || flag.store(true, Ordering::SeqCst),
//!         );
//!         Ok(())
//!     },
//!     &CallOptions::new(),
//! )?;
//!
//! let argv: Vec<String> = std::env::args().collect();
//! let parsed = climate.parse_and_verify(
//!     &argv,
//!     &CallOptions::new().with_parse_flags(ParseFlags::PANIC_ON_FAILURE),
//! )?;
//! # let _ = parsed;
//! # Ok::<(), libclimate::Error>(())
//! ```

/// Version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: &str = env!("CARGO_PKG_VERSION_MAJOR");
pub const VERSION_MINOR: &str = env!("CARGO_PKG_VERSION_MINOR");
pub const VERSION_PATCH: &str = env!("CARGO_PKG_VERSION_PATCH");

mod abort;
mod climate;
mod error;
mod exiter;
mod options;
mod parse;
mod verify;

pub use abort::{DEFAULT_USAGE_SUFFIX, usage_suffix};
pub use climate::{Climate, ClimateBuilder, ValuesConstraint};
pub use error::{Error, Result};
pub use exiter::{CaptureExiter, Exiter, ProcessExiter, StubExiter};
pub use options::{CallOption, CallOptions, InitFlags, OutputStream, ParseFlags, SharedBuffer};
pub use parse::Parsed;

pub use climate_clasp::{
    Argument, ArgumentKind, BitFlagsReceiver, Callback, Specification, SpecificationKind, Version,
};
