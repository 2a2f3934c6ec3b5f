//! Composite construction: a service collecting several resources through
//! a `CollectScope`, then owning them through the handed-off `WrapperScope`.
//!
//! Run with: `cargo run --example composite_service`

use closecore::HandleError;
use closecore_examples::spool::SpoolService;

fn main() -> Result<(), HandleError> {
    tracing_subscriber::fmt::init();

    let root = std::env::temp_dir().join(format!("closecore-composite-{}", std::process::id()));

    let mut service = SpoolService::start(&root)?;
    service.record("job-1 accepted")?;
    service.record("job-1 done")?;
    println!("service running under {}", root.display());

    service.shutdown()?;
    std::fs::remove_dir(&root)?;
    println!("service shut down, spool swept");
    Ok(())
}
