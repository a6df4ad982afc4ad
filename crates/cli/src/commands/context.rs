//! Context command handler.
//!
//! Shows what the retriever hands to the providers, without calling them.

use clap::Args;
use veriqa_core::{config::AppConfig, AppResult};
use veriqa_knowledge::{ContextRetriever, ContextSource, WikipediaRetriever};

/// Show the retrieved context for a query
#[derive(Args, Debug)]
pub struct ContextCommand {
    /// The query to look up
    pub query: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ContextCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing context command");
        let retriever = WikipediaRetriever::new(&config.retrieval)?;
        let context = retriever.retrieve(&self.query.join(" ")).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&context)?);
            return Ok(());
        }

        match &context.source {
            ContextSource::Article { title } => {
                println!("Source: {} ({})", title, retriever.source_name())
            }
            ContextSource::NoSummary { title } => println!("Source: {} (no summary)", title),
            ContextSource::NotFound => println!("Source: none"),
        }
        println!();
        println!("{}", context.text);

        Ok(())
    }
}
