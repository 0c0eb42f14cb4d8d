// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::PathBuf;

use clap::Parser;
use clutter_cli::dispatch;

#[derive(Parser)]
#[command(version, long_about = None)]
#[command(
    about = "Augment images, train and benchmark clutter segmentation models from a configuration file."
)]
struct Cli {
    #[arg(long, help = "Path to the configuration file.", required = true)]
    config: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = dispatch::run(&cli.config) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
