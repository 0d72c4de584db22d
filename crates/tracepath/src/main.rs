#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::option_if_let_else,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::struct_excessive_bools,
    clippy::struct_field_names
)]
#![forbid(unsafe_code)]

use crate::config::TracepathAction;
use clap::Parser;
use config::Args;

mod app;
mod config;
mod report;

fn main() -> anyhow::Result<()> {
    let program = std::env::args_os().next();
    let args = Args::parse()
        .with_program_name(program.as_deref())
        .unwrap_or_else(|err| err.exit());
    match TracepathAction::from(args)? {
        TracepathAction::Trace(cfg) => app::run_tracepath(&cfg)?,
        TracepathAction::PrintVersion => print_version(),
    }
    Ok(())
}

fn print_version() {
    println!("tracepath {}", clap::crate_version!());
}
