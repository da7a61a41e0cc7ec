use std::process::ExitCode;
use surge_runtime::SurgeRuntime;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    match SurgeRuntime::new().with_args().run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
