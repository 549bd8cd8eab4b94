use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    bnn_lib::main().await
}
