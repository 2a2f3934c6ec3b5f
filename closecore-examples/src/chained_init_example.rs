//! Chained initialization: directory, lock, journal, one `ChainScope`.
//!
//! Run with: `cargo run --example chained_init`

use closecore::{Close, HandleError};
use closecore_examples::spool::open_journal;

fn main() -> Result<(), HandleError> {
    tracing_subscriber::fmt::init();

    let root = std::env::temp_dir().join(format!("closecore-chained-{}", std::process::id()));

    let mut journal = open_journal(&root, "events.log")?;
    journal.append("first entry")?;
    journal.append("second entry")?;
    println!("journal written under {}", root.display());

    journal.close()?;
    println!("chain released, spool swept");
    Ok(())
}
