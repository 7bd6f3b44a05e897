#![forbid(unsafe_code)]

mod common;
mod logging;
mod options;
mod verbose;

use clap::Parser;
use color_eyre::eyre;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let options = options::Options::parse();
    common::bumpcalver(options)
}
