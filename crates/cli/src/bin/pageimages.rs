use anyhow::Result;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    pageimages_cli::main_entry()
}
