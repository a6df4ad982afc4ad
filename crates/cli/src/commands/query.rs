//! Query command handler.
//!
//! Runs the full answer pipeline for one question.

use clap::Args;
use veriqa_core::{config::AppConfig, AppResult};
use veriqa_detect::HallucinationSpan;
use veriqa_pipeline::{LaneReport, Pipeline};

/// Answer a question with both providers
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// The question to ask
    pub question: Vec<String>,

    /// Print the endpoint response body as JSON
    #[arg(long)]
    pub json: bool,

    /// Also print the retrieved context
    #[arg(long)]
    pub show_context: bool,
}

impl QueryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let question = self.question.join(" ");
        tracing::info!("Executing query command");

        let pipeline = Pipeline::from_config(config)?;
        let result = pipeline.run(&question).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result.to_response())?);
            return Ok(());
        }

        if self.show_context {
            println!("Context:\n{}\n", result.context.text);
        }

        for (id, lane) in result.lanes.iter() {
            let model = pipeline.providers().get(id).model();
            println!("== {} ({}) ==", id.display_name(), model);
            print_lane(lane);
            println!();
        }

        Ok(())
    }
}

fn print_lane(lane: &LaneReport) {
    println!("{}", lane.answer.display_text());
    if !lane.answer.is_success() {
        return;
    }

    if !lane.hallucination.is_scored() {
        println!("Hallucination: not scored ({})", lane.hallucination.label);
    } else {
        println!(
            "Hallucination: {} (p={:.3})",
            lane.hallucination.label, lane.hallucination.score
        );
    }
    if lane.spans.is_empty() {
        println!("Unsupported spans: none");
    } else {
        println!("Unsupported spans:");
        for span in &lane.spans {
            println!("  {}", describe_span(span));
        }
    }
}

fn describe_span(span: &HallucinationSpan) -> String {
    match span.confidence {
        Some(c) => format!("[{}..{}] {:?} ({:.2})", span.start, span.end, span.text, c),
        None => format!("[{}..{}] {:?}", span.start, span.end, span.text),
    }
}
