use anyhow::Result;

use super::common::load_orchestrator;

/// Execute `ramp display-name <feature> [name] [--clear]`
pub fn execute(feature: String, name: Option<String>, clear: bool) -> Result<()> {
    let orchestrator = load_orchestrator(false)?;

    if clear {
        orchestrator.set_display_name(&feature, None)?;
        println!("Cleared display name of {feature}");
        return Ok(());
    }

    match name {
        Some(name) => {
            orchestrator.set_display_name(&feature, Some(&name))?;
            println!("{feature}: {name}");
        }
        None => match orchestrator.display_name(&feature)? {
            Some(name) => println!("{name}"),
            None => println!("{feature} has no display name"),
        },
    }
    Ok(())
}
