//! Prompts command handler.

use clap::Args;
use veriqa_core::{config::AppConfig, AppResult};
use veriqa_prompt::{list_prompts, load_prompt, PromptOrigin};

/// List available prompts, or print one
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Print the named prompt instead of listing
    #[arg(long)]
    pub show: Option<String>,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        if let Some(id) = &self.show {
            let prompt = load_prompt(&config.workspace, id)?;
            println!("# {} ({})", prompt.title, prompt.id);
            if let Some(system) = &prompt.system {
                println!("\n[system]\n{}", system);
            }
            println!("\n[template]\n{}", prompt.template);
            return Ok(());
        }

        for (id, origin) in list_prompts(&config.workspace)? {
            let origin = match origin {
                PromptOrigin::Builtin => "builtin",
                PromptOrigin::Workspace => "workspace",
            };
            println!("{:<16} {}", id, origin);
        }
        Ok(())
    }
}
