//! Member color palette.

use crate::model::TeamMember;

pub const MEMBER_COLORS: [&str; 10] = [
    "#3B82F6", // blue
    "#10B981", // emerald
    "#F59E0B", // amber
    "#EF4444", // red
    "#8B5CF6", // violet
    "#EC4899", // pink
    "#06B6D4", // cyan
    "#84CC16", // lime
    "#F97316", // orange
    "#6366F1", // indigo
];

/// Color for unassigned chores.
pub const UNASSIGNED_COLOR: &str = "#6B7280";

/// First palette color nobody uses yet; once all are taken, cycle by member count.
pub fn next_available_color<S: AsRef<str>>(used_colors: &[S]) -> &'static str {
    MEMBER_COLORS
        .iter()
        .find(|c| !used_colors.iter().any(|u| u.as_ref().eq_ignore_ascii_case(c)))
        .copied()
        .unwrap_or(MEMBER_COLORS[used_colors.len() % MEMBER_COLORS.len()])
}

pub fn next_color_for(members: &[TeamMember]) -> &'static str {
    let used: Vec<&str> = members.iter().map(|m| m.color.as_str()).collect();
    next_available_color(&used)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_unused_color_wins() {
        assert_eq!(next_available_color::<&str>(&[]), "#3B82F6");
        assert_eq!(next_available_color(&["#3B82F6", "#F59E0B"]), "#10B981");
    }

    #[test]
    fn test_matching_ignores_hex_case() {
        assert_eq!(next_available_color(&["#3b82f6"]), "#10B981");
    }

    #[test]
    fn test_cycles_once_palette_is_exhausted() {
        let mut used: Vec<&str> = MEMBER_COLORS.to_vec();
        assert_eq!(next_available_color(&used), MEMBER_COLORS[0]);

        used.push(MEMBER_COLORS[0]);
        assert_eq!(next_available_color(&used), MEMBER_COLORS[1]);
    }
}
