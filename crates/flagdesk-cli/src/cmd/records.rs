use crate::output::{print_json, print_table};
use clap::Subcommand;
use flagdesk_core::types::Disposition;
use flagdesk_core::view::DashboardRow;
use flagdesk_core::workflow;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum RecordsSubcommand {
    /// List every record, most recently flagged first
    List,

    /// Record a disposition and clear the flag
    Submit {
        /// Document id
        id: String,
        /// block, warn, or accept
        action: String,
    },

    /// Raise the flag on a record
    Flag {
        /// Document id
        id: String,
    },

    /// Copy the template record under a new id
    Duplicate {
        /// Id for the new document
        new_id: String,
        /// Template document id (default: config `template_id`)
        #[arg(long)]
        template: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(
    config_path: Option<&Path>,
    demo: bool,
    subcmd: RecordsSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let store = super::open_store(&config, demo);

    match subcmd {
        RecordsSubcommand::List => {
            let records = workflow::load_ordered(store.as_ref())?;
            let now = chrono::Utc::now();
            let rows: Vec<DashboardRow> = records
                .iter()
                .map(|r| DashboardRow::from_record(r, now))
                .collect();

            if json {
                print_json(&rows)?;
            } else if rows.is_empty() {
                println!("No documents found in collection '{}'.", config.collection);
            } else {
                print_table(
                    &["ID", "ROLE", "LAST FLAGGED", "FLAG", "ACTION", "LINK", "REVIEW"],
                    rows.into_iter()
                        .map(|r| {
                            vec![
                                r.worker_id,
                                r.role,
                                r.last_flagged,
                                r.flagged.to_string(),
                                r.action,
                                r.link,
                                r.review,
                            ]
                        })
                        .collect(),
                );
            }
        }

        RecordsSubcommand::Submit { id, action } => {
            let action: Disposition = action.parse()?;
            workflow::submit(store.as_ref(), &id, action)?;
            if json {
                print_json(&serde_json::json!({
                    "id": id,
                    "action": action,
                    "flagged": false,
                }))?;
            } else {
                println!("Saved '{action}' and reset flag on '{id}'.");
            }
        }

        RecordsSubcommand::Flag { id } => {
            workflow::set_flag(store.as_ref(), &id)?;
            if json {
                print_json(&serde_json::json!({ "id": id, "flagged": true }))?;
            } else {
                println!("Flag set to true on '{id}'.");
            }
        }

        RecordsSubcommand::Duplicate { new_id, template } => {
            let template = template.unwrap_or_else(|| config.template_id.clone());
            let id = workflow::duplicate_template(store.as_ref(), &template, &new_id)?;
            if json {
                print_json(&serde_json::json!({ "id": id, "template_id": template }))?;
            } else {
                println!("Added '{id}' from template '{template}'.");
            }
        }
    }

    Ok(())
}
