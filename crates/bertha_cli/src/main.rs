use bertha_app::Event;
use clap::Parser;

use crate::opts::{build_events, Opts};

mod core;
mod opts;
mod view;

fn main() -> anyhow::Result<()> {
    let args = argfile::expand_args(argfile::parse_fromfile, argfile::PREFIX)?;

    let opts = Opts::parse_from(args);

    cli::tracing::configure_tracing(opts.trace.clone(), opts.verbose.clone())?;

    let core = core::new();

    core::run(&core, Event::LoadSources {
        path: opts.sources.clone(),
    })?;

    for event in build_events(opts.command) {
        core::run(&core, event)?;
    }

    Ok(())
}
