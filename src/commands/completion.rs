use anyhow::Result;
use chores_core::gateway::Gateway;
use chores_core::recurrence::occurrence_dates;
use chores_core::{Chore, NewCompletion, SyncStore};
use chrono::NaiveDate;

use crate::commands::report;
use crate::lookup;
use crate::utils::dates::parse_date;

fn require_occurrence(chore: &Chore, date: NaiveDate) -> Result<()> {
    if occurrence_dates(chore, date, date)?.is_empty() {
        anyhow::bail!(
            "{} does not occur on {}",
            chore.title,
            date.format("%a %Y-%m-%d")
        );
    }
    Ok(())
}

pub async fn done<G: Gateway>(
    store: &SyncStore<G>,
    chore_query: &str,
    date: &str,
    by: &str,
) -> Result<()> {
    let date = parse_date(date)?;
    let chores = store.chores();
    let chore = lookup::chore(&chores, chore_query)?;
    require_occurrence(chore, date)?;

    let members = store.members();
    let member = lookup::member(&members, by)?;

    let completion = NewCompletion::now(&chore.id, date, &member.id);
    let label = format!(
        "{} done on {} by {}",
        chore.title,
        date.format("%a %b %-d"),
        member.name
    );
    report(store.record_completion(completion).await, label);

    Ok(())
}

pub async fn undo<G: Gateway>(store: &SyncStore<G>, chore_query: &str, date: &str) -> Result<()> {
    let date = parse_date(date)?;
    let chores = store.chores();
    let chore = lookup::chore(&chores, chore_query)?;

    let label = format!(
        "{} on {} is no longer done",
        chore.title,
        date.format("%a %b %-d")
    );
    report(store.remove_completion(&chore.id, date).await, label);

    Ok(())
}
