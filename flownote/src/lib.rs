//! flownote: dataset versioning on top of git and dvc
//!
//! Layers, outermost first:
//! - `cli`: argument parsing and command dispatch
//! - `infrastructure`: I/O boundaries and service wiring
//! - `application`: services orchestrating git, dvc and the remote API
//! - `domain`: naming rules, version arithmetic, datasource descriptors

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
