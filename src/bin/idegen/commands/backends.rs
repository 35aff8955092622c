//! `idegen backends` command
//!
//! Lists the back ends and the categories each variant accepts.

use anyhow::Result;

use crate::cli::BackendsArgs;
use idegen::classify::{Classifier, ClassifierOptions};
use idegen::core::{BuildVariant, FlagCategory};
use idegen::BackendId;

pub fn execute(args: BackendsArgs) -> Result<()> {
    let options = ClassifierOptions::default();

    println!("Back Ends:");
    println!();

    for backend in BackendId::ALL {
        println!("  {} - {}", backend, backend.description());

        for variant in [BuildVariant::Application, BuildVariant::Library] {
            let classifier = Classifier::new(backend, variant, &options);
            let accepted: Vec<FlagCategory> = FlagCategory::ALL
                .into_iter()
                .filter(|c| classifier.supports(*c))
                .collect();
            let names: Vec<String> = accepted.iter().map(|c| c.to_string()).collect();
            println!("    {:<12} {}", format!("{}:", variant), names.join(", "));

            if args.rules {
                for category in accepted {
                    let rules = classifier.effective_rules(category);
                    if rules.is_empty() {
                        println!("      {:<9} (pass-through)", category);
                    } else {
                        println!("      {:<9} {}", category, rules.join(" "));
                    }
                }
                let source_rules = classifier.source_rule_names();
                if !source_rules.is_empty() {
                    println!("      {:<9} {}", "source", source_rules.join(" "));
                }
            }
        }
        println!();
    }

    Ok(())
}
