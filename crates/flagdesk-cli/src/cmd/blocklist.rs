use crate::output::print_json;
use clap::Subcommand;
use flagdesk_core::blocklist::{normalize_url, BlockLists};
use flagdesk_core::DeskError;

#[derive(Subcommand)]
pub enum BlocklistSubcommand {
    /// Print the stored form of a URL or bare domain
    Normalize { url: String },

    /// Print the starter lists as importable JSON
    Defaults,
}

pub fn run(subcmd: BlocklistSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        BlocklistSubcommand::Normalize { url } => {
            let normalized = normalize_url(&url).ok_or_else(|| DeskError::InvalidUrl(url.clone()))?;
            if json {
                print_json(&serde_json::json!({ "input": url, "normalized": normalized }))?;
            } else {
                println!("{normalized}");
            }
        }
        BlocklistSubcommand::Defaults => {
            println!("{}", BlockLists::seeded().export_json()?);
        }
    }
    Ok(())
}
