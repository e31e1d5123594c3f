mod args;

use args::Args;
use clap::error::ErrorKind;
use clap::Parser;
use cjit_native::{LogSink, SharedSink};
use cjit_rt::FAILURE_STATUS;
use log::LevelFilter;
use std::io::Write;
use std::rc::Rc;

/// Operator lines go to stderr as bare messages; `RUST_LOG` may refine the filter.
fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let status = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => FAILURE_STATUS,
            };
            // Nothing useful is left to do if even the usage text can't be printed.
            let _ = e.print();
            std::process::exit(status);
        }
    };

    init_logging(args.verbose.log_level_filter());
    log::debug!("{:?}", args);

    let config = args.launch_config();
    let sink: SharedSink = Rc::new(LogSink);
    let status = cjit_rt::run(&config, sink);
    std::process::exit(status);
}
