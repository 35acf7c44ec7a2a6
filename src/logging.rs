use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

pub fn init(debug: bool) -> Result<()> {
    if !debug {
        return Ok(());
    }
    let _ = fmt()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}
