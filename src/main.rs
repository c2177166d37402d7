//! Binary entry point for the `flzma2` analysis tool.
//!
//! 1. [`Cli::parse`] reads the flags; the environment fills in what is unset.
//! 2. Inputs are expanded (directories only with `-r`).
//! 3. Each file is analysed on one shared [`BuildPool`] and reported at
//!    display level 2.
//!
//! Errors are printed at display level 1 and turn the exit code to 1.

use std::process::ExitCode;

use clap::Parser;

use flzma2::cli::{analyze_file, Cli, FileReport};
use flzma2::display::set_display_level;
use flzma2::displaylevel;
use flzma2::threadpool::BuildPool;
use flzma2::util::{expand_inputs, resolve_thread_count};

fn print_report(report: &FileReport) {
    displaylevel!(
        2,
        "{}: {} bytes, {} blocks, {} literals, {} matches covering {:.2}%, coded {} bytes ({:.2}%), estimated {} bytes \n",
        report.path.display(),
        report.input_size,
        report.blocks,
        report.literals,
        report.matches,
        report.coverage(),
        report.coded_size,
        report.ratio(),
        report.estimated_size
    );
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = cli.settings_from_env()?;
    let nb_threads = resolve_thread_count(settings.nb_workers);
    let pool = BuildPool::new(nb_threads)?;
    displaylevel!(
        4,
        "using {} builder threads, depth {}, dictionary {} bytes \n",
        nb_threads,
        settings.params.depth,
        settings.params.dictionary_size
    );

    let files = expand_inputs(&cli.files, settings.recursive)?;
    for path in &files {
        let report = analyze_file(path, &settings, &pool)?;
        print_report(&report);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    set_display_level(cli.display_level());
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            displaylevel!(1, "flzma2: {:#} \n", e);
            ExitCode::FAILURE
        }
    }
}
