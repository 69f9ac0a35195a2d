//! Colored terminal output
//!
//! `colored` honors NO_COLOR and CLICOLOR_FORCE; data written with `info` is
//! never colored so it can be piped.

use colored::Colorize;
use serde::Serialize;

use crate::application::{ApplicationResult, ResultExt};

/// `error: <msg>` on stderr, prefix in bold red.
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// `<label>: <msg>` with a green label, e.g. `Pushed version: 8`.
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{msg}");
}

/// Pretty-printed JSON for `info`; `what` names the value in the error.
pub fn pretty_json<T: Serialize + ?Sized>(value: &T, what: &str) -> ApplicationResult<String> {
    serde_json::to_string_pretty(value).with_context(|| format!("render {what}"))
}
