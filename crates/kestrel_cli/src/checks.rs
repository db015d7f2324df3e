//! `kestrel checks`: list the available checks.

use kestrel_engine::CheckRegistry;

use crate::GlobalArgs;

/// Runs the `kestrel checks` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let registry = CheckRegistry::with_builtin_checks();
    for line in listing(&registry) {
        println!("{line}");
    }
    if !global.quiet {
        eprintln!("   {} check(s) available", registry.len());
    }
    Ok(0)
}

/// One `name  description` line per registered check, names aligned.
fn listing(registry: &CheckRegistry) -> Vec<String> {
    let names = registry.names();
    let width = names.iter().map(|n| n.len()).max().unwrap_or(0);
    names
        .into_iter()
        .filter_map(|name| {
            let check = registry.create(name)?;
            Some(format!("{name:<width$}  {}", check.description()))
        })
        .collect()
}
