mod cli;
mod infra;
mod report;
mod routes;
mod server;

use filing_compliance::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
