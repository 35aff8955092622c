//! `idegen classify` command
//!
//! Runs one flag line through a back end's rules and prints what was
//! recognized, with the tokens each setting came from.

use anyhow::Result;

use crate::cli::ClassifyArgs;
use idegen::classify::{Classified, Classifier};
use idegen::core::{ProjectModel, TargetName};
use idegen::util::config::load_for_project;

pub fn execute(args: ClassifyArgs) -> Result<()> {
    let config = load_for_project(std::path::Path::new("."));
    let classifier = Classifier::new(args.backend, args.variant, &config.classifier_options());

    let target = TargetName::new(args.target.as_str())?;
    let mut model = ProjectModel::new("classify", args.backend, args.variant, [target])?;
    let line = args.line.join(" ");

    let outcome = classifier.classify(&mut model, &args.target, args.category, &line)?;
    if let Classified::Skipped(_) = outcome {
        anyhow::bail!(
            "{}/{} does not accept {}\n\
             help: Run `idegen backends` to see the categories each variant accepts",
            args.backend,
            args.variant,
            args.category
        );
    }

    let settings = model.settings(&args.target, args.category)?;
    let opaque = model.opaque_flags(&args.target, args.category)?;

    if args.json {
        let value = serde_json::json!({
            "backend": args.backend,
            "variant": args.variant,
            "category": args.category,
            "target": args.target,
            "settings": settings,
            "opaque": opaque,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "# Settings for `{}` ({}, {}/{}):",
        args.target,
        args.category,
        args.backend,
        args.variant.short()
    );
    if settings.is_empty() {
        println!("  (none)");
    }
    for setting in settings {
        println!("  {}    # from: {}", setting, setting.source.join(" "));
    }

    println!();
    println!("# Opaque flags:");
    if opaque.is_empty() {
        println!("  (none)");
    }
    for flag in opaque {
        println!("  {}", flag);
    }

    Ok(())
}
