use anyhow::Result;
use timediary::cli::run_cli;
use tracing::error;

/// Every command is a sequence of awaited steps, a current-thread runtime is all it needs.
fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_cli()).inspect_err(|e| {
        error!("Error running cli {e:?}");
    })?;
    Ok(())
}
