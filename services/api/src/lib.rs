mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use shelter_intake::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
