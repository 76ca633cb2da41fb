use std::io::{self, Read};

use anyhow::{Context, Result};
use parley_core::markdown;

/// Reads markdown from stdin and prints the sanitized HTML.
pub fn run() -> Result<()> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("read stdin")?;

    println!("{}", markdown::render_html(&input));
    Ok(())
}
