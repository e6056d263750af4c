use nnets::grow::{Family, StrategySpec, REGISTRY};

/// Print the growth operator registry grouped by family.
pub fn cmd_list_funcs() {
    println!("Available training functions:");
    for family in Family::ALL {
        println!();
        println!("  {}:", family.title());
        for row in REGISTRY.iter().filter(|r| r.spec.strategy.family() == family) {
            let tag = if row.spec.parallel { " [parallel]" } else { "" };
            println!(
                "    {:<26} (alias {:<17}) +{} {}{}",
                row.name,
                row.alias,
                row.spec.appends(),
                row.description,
                tag
            );
        }
    }
    println!();
    println!("Default: {}", StrategySpec::DEFAULT);
    println!("Set \"funcs\": [...] in the config to choose a sequence per class step.");
}
