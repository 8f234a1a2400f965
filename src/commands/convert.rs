//! `convert`.

use anyhow::Result;

pub fn run(value: &str) -> Result<()> {
    println!("{}", reconcile::convert_hex_or_decimal(value)?);
    Ok(())
}
