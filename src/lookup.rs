//! Resolve members and chores from what the user typed.
//!
//! An exact id wins; otherwise names/titles are matched case-insensitively.

use anyhow::Result;
use chores_core::{Chore, TeamMember};

fn find_one<'a, T>(
    items: &'a [T],
    query: &str,
    kind: &str,
    id: impl Fn(&T) -> &str,
    name: impl Fn(&T) -> &str,
) -> Result<&'a T> {
    if let Some(item) = items.iter().find(|item| id(*item) == query) {
        return Ok(item);
    }

    let matches: Vec<&T> = items
        .iter()
        .filter(|item| name(*item).eq_ignore_ascii_case(query.trim()))
        .collect();

    match matches.as_slice() {
        [item] => Ok(*item),
        [] => {
            let available: Vec<&str> = items.iter().map(|item| name(item)).collect();
            if available.is_empty() {
                anyhow::bail!("No {kind}s yet.");
            }
            anyhow::bail!(
                "{} '{}' not found. Available: {}",
                capitalize(kind),
                query,
                available.join(", ")
            );
        }
        several => {
            let ids: Vec<&str> = several.iter().map(|item| id(*item)).collect();
            anyhow::bail!(
                "'{}' matches {} {kind}s. Use an id instead: {}",
                query,
                several.len(),
                ids.join(", ")
            );
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn member<'a>(members: &'a [TeamMember], query: &str) -> Result<&'a TeamMember> {
    find_one(members, query, "member", |m| m.id.as_str(), |m| m.name.as_str())
}

pub fn chore<'a>(chores: &'a [Chore], query: &str) -> Result<&'a Chore> {
    find_one(chores, query, "chore", |c| c.id.as_str(), |c| c.title.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chores_core::NewMember;

    fn members() -> Vec<TeamMember> {
        vec![
            NewMember::new("Ada", "#3B82F6").with_id("m1".into()),
            NewMember::new("Bo", "#10B981").with_id("m2".into()),
            NewMember::new("bo", "#F59E0B").with_id("m3".into()),
        ]
    }

    #[test]
    fn test_lookup_by_id_or_name() {
        let members = members();
        assert_eq!(member(&members, "m2").unwrap().name, "Bo");
        assert_eq!(member(&members, "ADA").unwrap().id, "m1");
    }

    #[test]
    fn test_ambiguous_name_lists_ids() {
        let members = members();
        let err = member(&members, "bo").unwrap_err().to_string();
        assert!(err.contains("m2, m3"));
    }

    #[test]
    fn test_unknown_name_lists_available() {
        let members = members();
        let err = member(&members, "Cy").unwrap_err().to_string();
        assert_eq!(err, "Member 'Cy' not found. Available: Ada, Bo, bo");
    }

    #[test]
    fn test_empty_collection() {
        let err = chore(&[], "Dishes").unwrap_err().to_string();
        assert_eq!(err, "No chores yet.");
    }
}
