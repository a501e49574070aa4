use anyhow::Result;
use chores_core::SyncStore;
use chores_core::gateway::Gateway;
use chores_core::history::{HistoryFilter, history_entries};
use owo_colors::OwoColorize;

use crate::lookup;
use crate::render::Render;

pub fn run<G: Gateway>(
    store: &SyncStore<G>,
    member_query: Option<&str>,
    chore_query: Option<&str>,
) -> Result<()> {
    let snapshot = store.snapshot();

    let filter = HistoryFilter {
        member_id: member_query
            .map(|query| lookup::member(&snapshot.members, query).map(|m| m.id.clone()))
            .transpose()?,
        chore_id: chore_query
            .map(|query| lookup::chore(&snapshot.chores, query).map(|c| c.id.clone()))
            .transpose()?,
    };

    let entries = history_entries(
        &snapshot.completions,
        &snapshot.chores,
        &snapshot.members,
        &filter,
    );

    if entries.is_empty() {
        if filter.is_empty() {
            println!("{}", "No chores completed yet".dimmed());
        } else {
            println!("{}", "No completions match".dimmed());
        }
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry.render());
    }

    Ok(())
}
