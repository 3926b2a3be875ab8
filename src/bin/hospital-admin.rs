use anyhow::Result;
use hospital_admin::cli::{self, telemetry};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    let action = cli::start()?;

    let result = action.execute().await;

    // Flush pending spans before exiting, even when the action failed.
    telemetry::shutdown_tracer();

    result
}
