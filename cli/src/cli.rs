use clap::{Parser, Subcommand, ValueEnum};
use last_commenter_renderer::config::PipelineVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    EmailOnly,
    AdminMatch,
    LastEditor,
}

impl From<VariantArg> for PipelineVariant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::EmailOnly => Self::EmailOnly,
            VariantArg::AdminMatch => Self::AdminMatch,
            VariantArg::LastEditor => Self::LastEditor,
        }
    }
}

#[derive(Parser)]
#[command(name = "lc-cli", version, about = "Last commenter cells for SharePoint list rows")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve rows and print the markup each cell ends up with.
    Render {
        /// Absolute site URL, e.g. https://contoso.sharepoint.com/sites/ops.
        #[arg(long)]
        web_url: String,
        /// List GUID. Without it every row resolves to an empty cell.
        #[arg(long)]
        list_id: Option<String>,
        /// Bearer token (defaults to the `SHAREPOINT_TOKEN` environment
        /// variable).
        #[arg(long)]
        token: Option<String>,
        /// Pipeline variant; overrides `LAST_COMMENTER_VARIANT`.
        #[arg(long, value_enum)]
        variant: Option<VariantArg>,
        /// Page URL used for the `ID` query parameter fallback.
        #[arg(long)]
        page_url: Option<String>,
        /// Number of render passes; passes after the first hit the cache.
        #[arg(long, default_value_t = 1)]
        passes: u32,
        /// Field values to render, one cell each.
        #[arg(required = true)]
        rows: Vec<String>,
    },
    /// Print the configuration resolved from the environment.
    Config {
        /// Pipeline variant; overrides `LAST_COMMENTER_VARIANT`.
        #[arg(long, value_enum)]
        variant: Option<VariantArg>,
    },
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands, VariantArg};

    #[test]
    fn render_parses_rows_and_variant() {
        let cli = Cli::try_parse_from([
            "lc-cli",
            "render",
            "--web-url",
            "https://contoso.sharepoint.com/sites/ops",
            "--list-id",
            "abc",
            "--variant",
            "last-editor",
            "--passes",
            "2",
            "10",
            "Open",
        ])
        .unwrap();

        let Commands::Render {
            variant,
            passes,
            rows,
            ..
        } = cli.command
        else {
            panic!("expected render command");
        };
        assert_eq!(variant, Some(VariantArg::LastEditor));
        assert_eq!(passes, 2);
        assert_eq!(rows, vec!["10".to_string(), "Open".to_string()]);
    }

    #[test]
    fn render_requires_rows() {
        let parsed = Cli::try_parse_from(["lc-cli", "render", "--web-url", "https://x.test"]);
        assert!(parsed.is_err());
    }
}
