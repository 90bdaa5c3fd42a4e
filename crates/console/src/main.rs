//! `aries` console: owns one service store and drives it from the command
//! line against the registry named by `ARIES_API`.

mod application;
mod cli;
mod commands;


use std::io;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    if let Err(err) = application::run(cli).await {
        eprintln!("[aries] {err}");
        return Err(io::Error::other(err.to_string()));
    }

    Ok(())
}
