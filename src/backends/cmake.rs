//! CMake generator rules.
//!
//! CMake keeps raw flags as they are, so the only construct worth
//! recognizing is the linker library group, which the generator splits
//! into `target_link_libraries` system and user entries.

use crate::backends::{variant_name, BackendId, APPLICATION_CATEGORIES, LIBRARY_CATEGORIES};
use crate::classify::matcher::LibraryGroup;
use crate::classify::{ClassifierOptions, Layer};
use crate::core::target::{BuildVariant, FlagCategory};

pub(super) fn chain(variant: BuildVariant, options: &ClassifierOptions) -> Layer {
    let family = Layer::family("cmake/common").rules(
        FlagCategory::Linker,
        vec![Box::new(LibraryGroup::new(&options.extra_system_libraries))],
    );
    let backend = Layer::backend(BackendId::CMake.as_str(), family);

    let name = variant_name(BackendId::CMake, variant);
    match variant {
        BuildVariant::Application => Layer::variant(name, backend).expose(APPLICATION_CATEGORIES),
        BuildVariant::Library => Layer::variant(name, backend).expose(LIBRARY_CATEGORIES),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_linker_has_rules() {
        let app = chain(BuildVariant::Application, &ClassifierOptions::default());
        assert_eq!(app.effective_rules(FlagCategory::Linker), vec!["libraries.group"]);
        for category in [
            FlagCategory::Assembler,
            FlagCategory::CCompiler,
            FlagCategory::CxxCompiler,
        ] {
            assert!(app.effective_rules(category).is_empty());
        }
    }
}
