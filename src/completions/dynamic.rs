//! Completion of feature and command names from the current project

use anyhow::Result;
use std::path::Path;

use crate::config::Project;

/// Context for shell completion
#[derive(Debug, Clone)]
pub struct CompletionContext {
    pub cwd: String,
    pub shell: String,
    pub cmdline: String,
    pub current_word: String,
    pub prev_word: String,
}

impl CompletionContext {
    /// Parse `[cwd, cmdline, current_word, prev_word]` as passed by the shell
    pub fn from_args(shell: &str, args: &[String]) -> Self {
        Self {
            cwd: args.first().cloned().unwrap_or_else(|| ".".to_string()),
            shell: shell.to_string(),
            cmdline: args.get(1).cloned().unwrap_or_default(),
            current_word: args.get(2).cloned().unwrap_or_default(),
            prev_word: args.get(3).cloned().unwrap_or_default(),
        }
    }
}

/// Feature names under `trees/` starting with `prefix`
pub fn complete_features(project: &Project, prefix: &str) -> Result<Vec<String>> {
    Ok(project
        .list_features()?
        .into_iter()
        .filter(|f| f.starts_with(prefix))
        .collect())
}

/// Custom command names starting with `prefix`
pub fn complete_commands(project: &Project, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = project
        .config()
        .commands
        .iter()
        .map(|c| c.name.clone())
        .filter(|n| n.starts_with(prefix))
        .collect();
    names.sort();
    names
}

/// Candidates for the word being completed, based on the previous word
pub fn candidates(ctx: &CompletionContext) -> Result<Vec<String>> {
    // Outside a project there is nothing to offer
    let Ok(project) = Project::discover(Path::new(&ctx.cwd)) else {
        return Ok(Vec::new());
    };
    let prefix = ctx.current_word.as_str();

    let words: Vec<&str> = ctx.cmdline.split_whitespace().collect();
    let in_run = words.get(1) == Some(&"run");

    Ok(match ctx.prev_word.as_str() {
        "down" | "rename" | "display-name" | "--target" => complete_features(&project, prefix)?,
        "run" => complete_commands(&project, prefix),
        _ if in_run && words.len() <= 4 => complete_features(&project, prefix)?,
        _ => Vec::new(),
    })
}

/// Print completion candidates, one per line
pub fn complete_dynamic(ctx: &CompletionContext) -> Result<()> {
    for completion in candidates(ctx)? {
        println!("{completion}");
    }
    Ok(())
}
