use anyhow::Result;
use colored::{ColoredString, Colorize};

use super::common::{format_ports, load_orchestrator};
use crate::features::{FeatureCategory, FeatureStatus, WorktreeState};

/// Execute `ramp status`: every feature, grouped by category
pub fn execute() -> Result<()> {
    let orchestrator = load_orchestrator(false)?;
    let project = orchestrator.project();
    let features = orchestrator.status()?;

    let title = if project.name().is_empty() {
        "ramp status".to_string()
    } else {
        format!("{} status", project.name())
    };
    println!("{}", title.bold().blue());
    println!("{}", "=".repeat(50));

    if features.is_empty() {
        println!("No features. Create one with: ramp up <name>");
        return Ok(());
    }

    for category in [
        FeatureCategory::NeedsAttention,
        FeatureCategory::Clean,
        FeatureCategory::Merged,
    ] {
        let group: Vec<&FeatureStatus> =
            features.iter().filter(|f| f.category == category).collect();
        if group.is_empty() {
            continue;
        }
        println!("\n{} ({})", category_label(category), group.len());
        for feature in group {
            display_feature(feature);
        }
    }

    let merged = features
        .iter()
        .filter(|f| f.category == FeatureCategory::Merged)
        .count();
    if merged > 0 {
        println!("\n{merged} merged feature(s) can be removed with: ramp prune");
    }
    Ok(())
}

fn category_label(category: FeatureCategory) -> ColoredString {
    let label = category.to_string();
    match category {
        FeatureCategory::NeedsAttention => label.yellow().bold(),
        FeatureCategory::Merged => label.green().bold(),
        FeatureCategory::Clean => label.bold(),
    }
}

fn display_feature(feature: &FeatureStatus) {
    let mut header = format!("  {}", feature.name.bold());
    if let Some(display_name) = &feature.display_name {
        header.push_str(&format!(" \"{display_name}\""));
    }
    if !feature.ports.is_empty() {
        header.push_str(&format!(" [ports {}]", format_ports(&feature.ports)));
    }
    println!("{header}");

    for repo in &feature.repos {
        match &repo.state {
            WorktreeState::Present(facts) => {
                let branch = facts.branch.as_deref().unwrap_or("(detached)");
                let mut notes = Vec::new();
                if facts.ahead > 0 {
                    notes.push(format!("{} ahead", facts.ahead));
                }
                if facts.behind > 0 {
                    notes.push(format!("{} behind", facts.behind));
                }
                if facts.has_uncommitted {
                    notes.push("uncommitted changes".yellow().to_string());
                }
                if facts.diff.files_changed > 0 {
                    notes.push(format!(
                        "{} files +{} -{}",
                        facts.diff.files_changed, facts.diff.insertions, facts.diff.deletions
                    ));
                }
                let notes = if notes.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", notes.join(", "))
                };
                println!("    {}: {}{notes}", repo.repo, branch.cyan());
            }
            WorktreeState::NotFound => {
                println!("    {}: {}", repo.repo, "worktree not found".dimmed())
            }
            WorktreeState::Error(e) => println!("    {}: {}", repo.repo, e.red()),
        }
    }
}
