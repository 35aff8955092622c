//! `idegen generate` command

use std::path::Path;

use anyhow::Result;

use crate::cli::GenerateArgs;
use idegen::ops::{self, GenerateOptions, JsonWriter};
use idegen::util::config::load_for_project;
use idegen::util::diagnostic::{self, suggestions, Diagnostic};

pub fn execute(args: GenerateArgs, color: bool) -> Result<()> {
    let project_root = args
        .description
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let config = load_for_project(project_root);

    let opts = GenerateOptions {
        backend: args.backend,
        variant: args.variant,
        out_dir: args.out,
    };
    let writer = JsonWriter::new(config.pretty() && !args.compact);

    let result = ops::generate(&args.description, &opts, &config, &writer)?;

    println!(
        "    Classified {} setting(s), {} opaque flag(s) for {} ({})",
        result.settings, result.opaque, result.backend, result.variant
    );
    if result.skipped > 0 {
        let warning = Diagnostic::warning(format!(
            "skipped {} line(s) the {} variant does not accept",
            result.skipped, result.variant
        ))
        .with_location(&args.description)
        .with_suggestion(suggestions::VERBOSE);
        diagnostic::emit(&warning, color);
    }
    for path in &result.written {
        println!("      Wrote {}", path.display());
    }

    Ok(())
}
