//! Call command handler.
//!
//! Feeds a raw request through the endpoint router, the same way an HTTP
//! server mounting the service would.

use clap::Args;
use std::path::PathBuf;
use veriqa_core::{config::AppConfig, AppError, AppResult};
use veriqa_pipeline::Service;

/// Send a raw JSON request to an endpoint handler
#[derive(Args, Debug)]
pub struct CallCommand {
    /// Endpoint path (/query or /improve_query)
    pub path: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "POST")]
    pub method: String,

    /// Request body as a JSON string
    #[arg(short, long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the request body from a file
    #[arg(long)]
    pub body_file: Option<PathBuf>,
}

impl CallCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing call command");

        let body = match (&self.body, &self.body_file) {
            (Some(body), _) => body.clone().into_bytes(),
            (None, Some(path)) => std::fs::read(path)?,
            (None, None) => b"{}".to_vec(),
        };

        let service = Service::from_config(config)?;
        let response = service.handle(&self.method, &self.path, &body).await;

        eprintln!("HTTP {}", response.status);
        println!("{}", serde_json::to_string_pretty(&response.body)?);

        if response.is_success() {
            Ok(())
        } else {
            Err(AppError::Other(format!(
                "{} {} returned {}",
                self.method, self.path, response.status
            )))
        }
    }
}
