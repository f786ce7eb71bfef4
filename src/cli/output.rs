//! Operator-facing console output.
//!
//! One colored line per test plus the aggregate totals, written to stderr
//! so the progress stream on stdout stays uncluttered.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::results::TestResults;

fn color_choice() -> ColorChoice {
    if atty::is(atty::Stream::Stderr) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Print one line per test plus the aggregate summary.
pub fn print_summary(results: &TestResults) {
    let mut stderr = StandardStream::stderr(color_choice());

    for sub in results.sub_results() {
        let (tag, color) = if sub.errors() > 0 {
            ("ERROR", Color::Red)
        } else if sub.failed() > 0 {
            ("FAIL", Color::Red)
        } else if sub.passed() == 0 && sub.pending() > 0 {
            ("PENDING", Color::Yellow)
        } else {
            ("PASS", Color::Green)
        };

        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(stderr, "{:>7}", tag);
        let _ = stderr.reset();
        let _ = writeln!(stderr, " {} ({})", sub.name(), sub);
    }

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "{}", results);
}
