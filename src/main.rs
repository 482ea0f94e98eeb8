use anyhow::Context;
use colored::Colorize;

use cascade_permissions::logging;
use cascade_permissions::permissions::PermissionAction;
use cascade_permissions::scenario::Scenario;

fn main() -> anyhow::Result<()> {
    logging::init_logging()?;

    let path = std::env::args()
        .nth(1)
        .context("usage: cascade-perms <scenario.json>")?;

    let scenario =
        Scenario::load(&path).with_context(|| format!("Failed to load scenario {}", path))?;
    tracing::info!(
        "Loaded scenario: {} groups, {} checks ({} mode)",
        scenario.groups.len(),
        scenario.checks.len(),
        scenario.config.mode
    );

    let outcomes = scenario.run().context("Failed to run scenario")?;

    let mut failures = 0;
    for outcome in &outcomes {
        let verdict = match outcome.decision.action {
            PermissionAction::Allow => "ALLOW".green().bold(),
            PermissionAction::Deny => "DENY".red().bold(),
            PermissionAction::Neutral => "DENY".yellow().bold(),
        };
        let channel = outcome
            .check
            .channel
            .map(|c| format!(" in #{}", c))
            .unwrap_or_default();
        let mark = if outcome.meets_expectation() {
            "".normal()
        } else {
            failures += 1;
            " (unexpected)".red()
        };

        println!(
            "{:<5} {} -> {}{} [{:?}]{}",
            verdict,
            outcome.check.member,
            outcome.check.node,
            channel,
            outcome.decision.source,
            mark
        );
    }

    if failures > 0 {
        anyhow::bail!("{} of {} checks did not match expectations", failures, outcomes.len());
    }

    Ok(())
}
