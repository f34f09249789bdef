//! Stats command handler

use anyhow::Result;

use linknest_core::Store;

use crate::output::Output;

/// Show collection statistics
pub fn show(store: &Store, output: &Output) -> Result<()> {
    output.print_stats(&store.stats());
    Ok(())
}
