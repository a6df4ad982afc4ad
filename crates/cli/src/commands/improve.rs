//! Improve command handler.

use clap::Args;
use veriqa_core::{config::AppConfig, AppError, AppResult};
use veriqa_pipeline::{QueryRefiner, RefinementError};

/// Rewrite a question to be more precise
#[derive(Args, Debug)]
pub struct ImproveCommand {
    /// The question to rewrite
    pub question: Vec<String>,

    /// Print {"improved_query": ...} instead of plain text
    #[arg(long)]
    pub json: bool,
}

impl ImproveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing improve command");
        let refiner = QueryRefiner::from_config(config)?;
        tracing::debug!(provider = refiner.provider().id().as_str(), "Refiner ready");

        let improved = refiner
            .improve_query(&self.question.join(" "))
            .await
            .map_err(|e| match e {
                RefinementError::EmptyInput => AppError::Other(e.to_string()),
                RefinementError::Backend(msg) => AppError::Llm(msg),
            })?;

        if self.json {
            let body = serde_json::json!({ "improved_query": improved });
            println!("{}", serde_json::to_string_pretty(&body)?);
        } else {
            println!("{}", improved);
        }

        Ok(())
    }
}
