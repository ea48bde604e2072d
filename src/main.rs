use std::process;

use clap::Parser;
use env_logger::Env;
use log::LevelFilter;

use teenytiny::driver::{self, Cli};

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  if let Err(err) = driver::run(&cli) {
    match err.partial_output() {
      Some(_) => eprintln!("{err}"),
      None => eprintln!("{} error: {err}", err.category()),
    }
    if let Some(partial) = err.partial_output()
      && !partial.is_empty()
    {
      eprintln!("\npartial output:\n{partial}");
    }
    process::exit(err.exit_code());
  }
}

fn init_logging(verbose: bool) {
  let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
  if verbose {
    builder.filter_level(LevelFilter::Debug);
  }
  builder.init();
}
