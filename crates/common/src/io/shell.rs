//! Minimal shell used by the `sh_*` macros.

use std::{
    fmt,
    io::{self, Write},
    sync::atomic::{AtomicBool, Ordering},
};
use yansi::Paint;

static QUIET: AtomicBool = AtomicBool::new(false);

/// Silences [`println`] output. Warnings and errors are always printed.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

/// Returns `true` if stdout output is silenced.
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

#[doc(hidden)]
pub fn println(args: fmt::Arguments<'_>) -> io::Result<()> {
    if is_quiet() {
        return Ok(());
    }
    let mut stdout = anstream::stdout();
    writeln!(stdout, "{args}")
}

#[doc(hidden)]
pub fn warn(args: fmt::Arguments<'_>) -> io::Result<()> {
    let mut stderr = anstream::stderr();
    writeln!(stderr, "{}: {args}", "Warning".yellow().bold())
}

#[doc(hidden)]
pub fn error(args: fmt::Arguments<'_>) -> io::Result<()> {
    let mut stderr = anstream::stderr();
    writeln!(stderr, "{}: {args}", "Error".red().bold())
}
