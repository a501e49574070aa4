pub mod calendar;
pub mod chore;
pub mod completion;
pub mod history;
pub mod member;

use chores_core::MutationOutcome;
use owo_colors::OwoColorize;

/// Print the result of a store mutation. Failures are left in the store's
/// error slot and reported once the command returns.
fn report(outcome: MutationOutcome, success: String) {
    match outcome {
        MutationOutcome::Committed => println!("{}", success),
        MutationOutcome::Unchanged => println!("{}", "Nothing to change".dimmed()),
        MutationOutcome::RolledBack | MutationOutcome::Rejected => {}
    }
}
