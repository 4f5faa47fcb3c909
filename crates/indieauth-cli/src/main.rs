use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match indieauth_cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(indieauth_cli::error::exit_code(&e))
        }
    }
}
