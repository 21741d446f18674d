use anyhow::Result;

use super::common::load_orchestrator;
use crate::scripts::CancelToken;

/// Execute `ramp run <command> [feature]`
pub fn execute(command: String, feature: Option<String>) -> Result<()> {
    let orchestrator = load_orchestrator(false)?.with_cancel(CancelToken::from_ctrlc()?);
    orchestrator.run_command(&command, feature.as_deref())
}
