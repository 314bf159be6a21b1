pub mod config;
pub mod render;

use anyhow::Result;
use serde::Serialize;

use crate::cli::{Cli, Commands};

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Render {
            web_url,
            list_id,
            token,
            variant,
            page_url,
            passes,
            rows,
        } => {
            render::run(render::RenderArgs {
                web_url,
                list_id,
                token,
                variant: variant.map(Into::into),
                page_url,
                passes,
                rows,
            })
            .await
        },
        Commands::Config {
            variant,
        } => config::run(variant.map(Into::into)),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
