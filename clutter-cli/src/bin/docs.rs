#![allow(clippy::all)]
use std::path::PathBuf;

use clap::Parser;
use clap_markdown;

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
    clap_markdown::print_help_markdown::<Cli>();
}
