use anyhow::Result;
use last_commenter_renderer::config::{PipelineVariant, RendererConfig};
use serde::Serialize;

use super::print_json;

#[derive(Debug, Serialize)]
struct EffectiveConfig<'a> {
    variant: &'static str,
    cache_capacity: usize,
    admin_field_1: &'a str,
    admin_field_2: &'a str,
    http_timeout_seconds: u64,
}

pub fn run(variant: Option<PipelineVariant>) -> Result<()> {
    let config = load(variant)?;
    print_json(&EffectiveConfig {
        variant: config.variant.as_str(),
        cache_capacity: config.cache_capacity.get(),
        admin_field_1: &config.admin_fields.first,
        admin_field_2: &config.admin_fields.second,
        http_timeout_seconds: config.http_timeout.as_secs(),
    })
}

/// Environment config with the command-line variant applied on top.
pub fn load(variant: Option<PipelineVariant>) -> Result<RendererConfig> {
    let mut config = RendererConfig::from_env()?;
    if let Some(variant) = variant {
        config.variant = variant;
    }
    Ok(config)
}
