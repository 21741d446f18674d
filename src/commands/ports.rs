use anyhow::Result;
use colored::Colorize;

use super::common::{format_ports, load_orchestrator};

/// Execute `ramp ports`: list port allocations
pub fn execute() -> Result<()> {
    let orchestrator = load_orchestrator(false)?;
    let Some(settings) = orchestrator.project().port_settings() else {
        println!("Port allocation is not configured (set base_port in .ramp/ramp.yaml)");
        return Ok(());
    };

    let allocations = orchestrator.port_allocations()?;
    let used: usize = allocations.values().map(Vec::len).sum();
    println!(
        "{} {}..{} ({used}/{} in use)",
        "Port range".bold(),
        settings.base,
        u32::from(settings.base) + u32::from(settings.max),
        settings.max
    );
    for (feature, ports) in &allocations {
        println!("  {feature}: {}", format_ports(ports));
    }
    Ok(())
}
