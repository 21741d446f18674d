//! `run`: named custom commands from the project config

use anyhow::Result;

use super::Orchestrator;
use crate::error::RampError;
use crate::scripts::{ScriptContext, ScriptKind};

impl Orchestrator {
    /// Run command `name`, against `feature`'s worktrees or the source checkouts.
    ///
    /// No project lock is taken: commands such as dev servers run for as
    /// long as the user wants.
    pub fn run_command(&self, name: &str, feature: Option<&str>) -> Result<()> {
        let project = &self.project;
        let command = project
            .command(name)
            .ok_or_else(|| RampError::UnknownCommand(name.to_string()))?;
        let script = project.script_path(&command.command);

        let ctx = match feature {
            Some(feature) => {
                self.require_feature(feature)?;
                let ports = self.feature_ports(feature)?;
                let display_name = self.metadata().display_name(feature)?;
                ScriptContext::for_feature(project, feature, &ports, display_name.as_deref())
            }
            None => ScriptContext::for_source(project),
        };

        self.scripts
            .run(&ScriptKind::Command(name.to_string()), &script, &ctx)
    }
}
