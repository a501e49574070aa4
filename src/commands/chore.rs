use std::collections::BTreeSet;

use anyhow::Result;
use chores_core::gateway::Gateway;
use chores_core::model::rule::parse_weekday;
use chores_core::{
    Chore, ChorePatch, Frequency, FrequencyKind, NewChore, RecurrenceRule, SyncStore,
};
use chrono::{Datelike, NaiveDate};
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::commands::report;
use crate::lookup;
use crate::render::{ChoreRow, Render, pluralize};
use crate::utils::dates::{parse_date, parse_optional_date};

pub struct AddArgs {
    pub title: String,
    pub start: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub every: Option<String>,
    pub interval: u32,
    pub days: Option<String>,
    pub day_of_month: Option<u8>,
    pub until: Option<String>,
}

pub struct EditArgs {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<String>,
    pub every: Option<String>,
    pub interval: Option<u32>,
    pub days: Option<String>,
    pub day_of_month: Option<u8>,
    pub until: Option<String>,
    pub no_until: bool,
    pub no_repeat: bool,
}

/// Recurrence changes requested by `chore edit`.
#[derive(Default)]
struct RuleEdits {
    every: Option<FrequencyKind>,
    interval: Option<u32>,
    days: Option<BTreeSet<u8>>,
    day_of_month: Option<u8>,
    until: Option<Option<NaiveDate>>,
}

impl RuleEdits {
    fn is_empty(&self) -> bool {
        self.every.is_none()
            && self.interval.is_none()
            && self.days.is_none()
            && self.day_of_month.is_none()
            && self.until.is_none()
    }
}

fn parse_days(days: &str) -> Result<Vec<u8>> {
    Ok(days
        .split(',')
        .map(parse_weekday)
        .collect::<Result<Vec<u8>, _>>()?)
}

pub fn list<G: Gateway>(store: &SyncStore<G>) -> Result<()> {
    let snapshot = store.snapshot();

    if snapshot.chores.is_empty() {
        println!("{}", "No chores yet".dimmed());
        println!(
            "{}",
            "Add one with: chores chore add <title> --start <date>".dimmed()
        );
        return Ok(());
    }

    for chore in snapshot.chores.iter() {
        let assignee = chore
            .assignee_id
            .as_deref()
            .and_then(|id| snapshot.member(id));
        println!("{}", ChoreRow { chore, assignee }.render());
    }

    Ok(())
}

/// Build the recurrence rule from the `chore add` flags, or `None` for a one-time chore.
fn build_rule(
    start: NaiveDate,
    every: Option<&str>,
    interval: u32,
    days: Option<&str>,
    day_of_month: Option<u8>,
    until: Option<NaiveDate>,
) -> Result<Option<RecurrenceRule>> {
    let Some(every) = every else {
        if days.is_some() || day_of_month.is_some() || until.is_some() {
            anyhow::bail!("--days, --day-of-month and --until need --every");
        }
        return Ok(None);
    };

    let rule = match every.parse::<FrequencyKind>()? {
        FrequencyKind::Daily => RecurrenceRule::daily(interval),
        FrequencyKind::Weekly => {
            let days = match days {
                Some(days) => parse_days(days)?,
                None => vec![start.weekday().num_days_from_sunday() as u8],
            };
            RecurrenceRule::weekly(interval, days)
        }
        FrequencyKind::Monthly => {
            let day = day_of_month.unwrap_or(start.day() as u8);
            RecurrenceRule::monthly(interval, day)
        }
    };

    let rule = match until {
        Some(end) => rule.until(end),
        None => rule,
    };
    rule.validate()?;

    Ok(Some(rule))
}

pub async fn add<G: Gateway>(store: &SyncStore<G>, args: AddArgs) -> Result<()> {
    let start = parse_date(&args.start)?;
    let until = parse_optional_date(args.until.as_deref())?;
    let rule = build_rule(
        start,
        args.every.as_deref(),
        args.interval,
        args.days.as_deref(),
        args.day_of_month,
        until,
    )?;

    let mut chore = match rule {
        Some(rule) => NewChore::recurring(&args.title, start, rule),
        None => NewChore::one_time(&args.title, start),
    };
    chore.description = args.description.filter(|d| !d.trim().is_empty());

    if let Some(query) = &args.assignee {
        let members = store.members();
        chore = chore.assigned_to(&lookup::member(&members, query)?.id);
    }

    let label = format!("Created {}", chore.title);
    report(store.add_chore(chore).await, label);

    Ok(())
}

/// Select exactly `wanted` on a weekly rule, one toggle at a time.
fn set_days(rule: &mut RecurrenceRule, wanted: &BTreeSet<u8>) -> Result<()> {
    let Frequency::Weekly { days_of_week } = &rule.frequency else {
        anyhow::bail!("--days only applies to weekly chores");
    };
    let current = days_of_week.clone();

    // Add before removing so the rule is never left without a day
    for day in wanted.difference(&current) {
        rule.toggle_day(*day)?;
    }
    for day in current.difference(wanted) {
        rule.toggle_day(*day)?;
    }

    Ok(())
}

/// Apply recurrence edits to a chore's current rule. `None` when nothing changes.
fn edit_rule(
    current: Option<&RecurrenceRule>,
    edits: &RuleEdits,
) -> Result<Option<RecurrenceRule>> {
    if edits.is_empty() {
        return Ok(None);
    }

    let mut rule = match (current, edits.every) {
        (Some(rule), Some(kind)) if rule.frequency.kind() == kind => rule.clone(),
        (Some(rule), Some(kind)) => rule.with_frequency_kind(kind),
        (Some(rule), None) => rule.clone(),
        (None, Some(kind)) => RecurrenceRule::default().with_frequency_kind(kind),
        (None, None) => {
            anyhow::bail!("This chore doesn't repeat. Pass --every to make it recurring")
        }
    };

    if let Some(interval) = edits.interval {
        rule.interval = interval;
    }
    if let Some(days) = &edits.days {
        set_days(&mut rule, days)?;
    }
    if let Some(day) = edits.day_of_month {
        match &mut rule.frequency {
            Frequency::Monthly { day_of_month } => *day_of_month = day,
            _ => anyhow::bail!("--day-of-month only applies to monthly chores"),
        }
    }
    if let Some(until) = edits.until {
        rule.end_date = until;
    }

    rule.validate()?;
    Ok(Some(rule))
}

fn build_patch(chore: &Chore, args: &EditArgs) -> Result<ChorePatch> {
    let until = match (args.no_until, args.until.as_deref()) {
        (true, Some(_)) => anyhow::bail!("--until and --no-until cannot be combined"),
        (true, None) => Some(None),
        (false, until) => parse_optional_date(until)?.map(Some),
    };

    let edits = RuleEdits {
        every: args
            .every
            .as_deref()
            .map(|every| every.parse::<FrequencyKind>())
            .transpose()?,
        interval: args.interval,
        days: args
            .days
            .as_deref()
            .map(|days| parse_days(days).map(|days| days.into_iter().collect()))
            .transpose()?,
        day_of_month: args.day_of_month,
        until,
    };

    let recurrence = if args.no_repeat {
        if !edits.is_empty() {
            anyhow::bail!("--no-repeat cannot be combined with other recurrence flags");
        }
        Some(None)
    } else {
        edit_rule(chore.recurrence.as_ref(), &edits)?.map(Some)
    };

    let patch = ChorePatch {
        title: args.title.as_ref().map(|title| title.trim().to_string()),
        description: args
            .description
            .as_ref()
            .map(|d| Some(d.trim().to_string()).filter(|d| !d.is_empty())),
        assignee_id: None,
        start_date: args.start.as_deref().map(parse_date).transpose()?,
        recurrence,
    };
    patch.validate()?;

    Ok(patch)
}

pub async fn edit<G: Gateway>(store: &SyncStore<G>, query: &str, args: EditArgs) -> Result<()> {
    let chores = store.chores();
    let chore = lookup::chore(&chores, query)?;

    let patch = build_patch(chore, &args)?;
    if patch.is_empty() {
        anyhow::bail!(
            "Nothing to change. Pass --title, --description, --start or a recurrence flag."
        );
    }

    let label = format!(
        "Updated {}",
        patch.title.as_deref().unwrap_or(chore.title.as_str())
    );
    report(store.update_chore(&chore.id, patch).await, label);

    Ok(())
}

pub async fn assign<G: Gateway>(
    store: &SyncStore<G>,
    chore_query: &str,
    member_query: Option<&str>,
) -> Result<()> {
    let chores = store.chores();
    let chore = lookup::chore(&chores, chore_query)?;

    let members = store.members();
    let member = member_query
        .map(|query| lookup::member(&members, query))
        .transpose()?;

    let label = match member {
        Some(member) => format!("Assigned {} to {}", chore.title, member.name),
        None => format!("Unassigned {}", chore.title),
    };
    let patch = ChorePatch::assign(member.map(|m| m.id.as_str()));
    report(store.update_chore(&chore.id, patch).await, label);

    Ok(())
}

pub async fn remove<G: Gateway>(store: &SyncStore<G>, query: &str, yes: bool) -> Result<()> {
    let chores = store.chores();
    let chore = lookup::chore(&chores, query)?;

    let completed = store
        .completions()
        .iter()
        .filter(|c| c.chore_id == chore.id)
        .count();

    if completed > 0 && !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove {}? Its {} {} will be deleted too.",
                chore.title,
                completed,
                pluralize("completion", completed)
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            return Ok(());
        }
    }

    let label = format!("Removed {}", chore.title);
    report(store.remove_chore(&chore.id).await, label);

    Ok(())
}
