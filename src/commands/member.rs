use anyhow::Result;
use chores_core::gateway::Gateway;
use chores_core::palette::next_color_for;
use chores_core::{NewMember, SyncStore};
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::commands::report;
use crate::lookup;
use crate::render::{Render, pluralize};

pub fn list<G: Gateway>(store: &SyncStore<G>) -> Result<()> {
    let snapshot = store.snapshot();

    if snapshot.members.is_empty() {
        println!("{}", "No team members yet".dimmed());
        println!("{}", "Add one with: chores member add <name>".dimmed());
        return Ok(());
    }

    for member in snapshot.members.iter() {
        let assigned = snapshot
            .chores
            .iter()
            .filter(|c| c.assignee_id.as_deref() == Some(member.id.as_str()))
            .count();
        let count = format!("{} {}", assigned, pluralize("chore", assigned));

        println!("{}  {}  {}", member.render(), count.dimmed(), member.id.dimmed());
    }

    Ok(())
}

pub async fn add<G: Gateway>(store: &SyncStore<G>, name: &str, color: Option<&str>) -> Result<()> {
    let color = match color {
        Some(color) => color.to_string(),
        None => next_color_for(&store.members()).to_string(),
    };

    let member = NewMember::new(name, &color);
    let label = format!("Added {}", member.name);
    report(store.add_member(member).await, label);

    Ok(())
}

pub async fn remove<G: Gateway>(store: &SyncStore<G>, query: &str, yes: bool) -> Result<()> {
    let members = store.members();
    let member = lookup::member(&members, query)?;

    let assigned = store
        .chores()
        .iter()
        .filter(|c| c.assignee_id.as_deref() == Some(member.id.as_str()))
        .count();

    if assigned > 0 && !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove {}? Their {} {} will be unassigned.",
                member.name,
                assigned,
                pluralize("chore", assigned)
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            return Ok(());
        }
    }

    let label = format!("Removed {}", member.name);
    report(store.remove_member(&member.id).await, label);

    Ok(())
}
