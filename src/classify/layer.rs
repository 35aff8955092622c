//! Override chain: family, back-end and variant layers.
//!
//! Every (back end, variant) pair resolves to exactly one chain of three
//! layers. A layer holds its own rules per category and decides, per
//! category, whether its parent runs before its rules, after them, or not
//! at all. A category a layer has no rules for is handed to the parent.

use std::collections::BTreeMap;

use crate::classify::matcher::{MatchContext, Matcher};
use crate::core::target::FlagCategory;

/// Role of a layer in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Base rule table of a back-end family
    Family,
    /// Back end proper: logs received lines, delegates to the family
    Backend,
    /// Application or library specialization
    Variant,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Family => "family",
            LayerKind::Backend => "backend",
            LayerKind::Variant => "variant",
        }
    }
}

/// How a layer's own rules combine with its parent's for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delegation {
    /// Parent runs first, own rules post-process the residual
    ParentFirst,
    /// Own rules run first, parent sees the residual
    ParentLast,
    /// Parent is not consulted
    Supersede,
}

struct CategoryRules {
    delegation: Delegation,
    matchers: Vec<Box<dyn Matcher>>,
}

/// One level of specialization.
pub struct Layer {
    name: String,
    kind: LayerKind,
    parent: Option<Box<Layer>>,
    rules: BTreeMap<FlagCategory, CategoryRules>,
    exposed: Option<Vec<FlagCategory>>,
}

impl Layer {
    fn with_kind(name: impl Into<String>, kind: LayerKind, parent: Option<Layer>) -> Self {
        Layer {
            name: name.into(),
            kind,
            parent: parent.map(Box::new),
            rules: BTreeMap::new(),
            exposed: None,
        }
    }

    /// Root layer holding a family's base rule table.
    pub fn family(name: impl Into<String>) -> Self {
        Self::with_kind(name, LayerKind::Family, None)
    }

    /// Back-end layer on top of its family.
    pub fn backend(name: impl Into<String>, family: Layer) -> Self {
        Self::with_kind(name, LayerKind::Backend, Some(family))
    }

    /// Variant layer on top of a back end.
    pub fn variant(name: impl Into<String>, backend: Layer) -> Self {
        Self::with_kind(name, LayerKind::Variant, Some(backend))
    }

    /// Rules for a category, consulted on their own (the parent is skipped).
    pub fn rules(self, category: FlagCategory, matchers: Vec<Box<dyn Matcher>>) -> Self {
        self.with_rules(category, Delegation::Supersede, matchers)
    }

    /// Rules that post-process what the parent left.
    pub fn after_parent(self, category: FlagCategory, matchers: Vec<Box<dyn Matcher>>) -> Self {
        self.with_rules(category, Delegation::ParentFirst, matchers)
    }

    /// Rules that run before the parent sees the line.
    pub fn before_parent(self, category: FlagCategory, matchers: Vec<Box<dyn Matcher>>) -> Self {
        self.with_rules(category, Delegation::ParentLast, matchers)
    }

    fn with_rules(
        mut self,
        category: FlagCategory,
        delegation: Delegation,
        matchers: Vec<Box<dyn Matcher>>,
    ) -> Self {
        self.rules.insert(
            category,
            CategoryRules {
                delegation,
                matchers,
            },
        );
        self
    }

    /// Restrict the categories this layer accepts.
    pub fn expose(mut self, categories: &[FlagCategory]) -> Self {
        self.exposed = Some(categories.to_vec());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&Layer> {
        self.parent.as_deref()
    }

    /// Whether a category is accepted; the nearest layer declaring a set decides.
    pub fn exposes(&self, category: FlagCategory) -> bool {
        match (&self.exposed, &self.parent) {
            (Some(exposed), _) => exposed.contains(&category),
            (None, Some(parent)) => parent.exposes(category),
            (None, None) => true,
        }
    }

    /// Run the effective rule sequence of `category` over `line`.
    pub fn run(&self, category: FlagCategory, line: String, ctx: &mut MatchContext<'_>) -> String {
        if self.kind == LayerKind::Backend {
            tracing::debug!("{} {} line: {}", self.name, category, line.trim());
        }

        let Some(rules) = self.rules.get(&category) else {
            return self.run_parent(category, line, ctx);
        };

        match rules.delegation {
            Delegation::ParentFirst => {
                let line = self.run_parent(category, line, ctx);
                apply_all(&rules.matchers, line, ctx)
            }
            Delegation::ParentLast => {
                let line = apply_all(&rules.matchers, line, ctx);
                self.run_parent(category, line, ctx)
            }
            Delegation::Supersede => apply_all(&rules.matchers, line, ctx),
        }
    }

    fn run_parent(&self, category: FlagCategory, line: String, ctx: &mut MatchContext<'_>) -> String {
        match &self.parent {
            Some(parent) => parent.run(category, line, ctx),
            None => line,
        }
    }

    /// Matcher names of the effective rule sequence, in execution order.
    pub fn effective_rules(&self, category: FlagCategory) -> Vec<String> {
        let parent_rules = || {
            self.parent
                .as_ref()
                .map(|p| p.effective_rules(category))
                .unwrap_or_default()
        };
        let own = |rules: &CategoryRules| {
            rules
                .matchers
                .iter()
                .map(|m| m.name().to_string())
                .collect::<Vec<_>>()
        };

        match self.rules.get(&category) {
            None => parent_rules(),
            Some(rules) => match rules.delegation {
                Delegation::ParentFirst => {
                    let mut names = parent_rules();
                    names.extend(own(rules));
                    names
                }
                Delegation::ParentLast => {
                    let mut names = own(rules);
                    names.extend(parent_rules());
                    names
                }
                Delegation::Supersede => own(rules),
            },
        }
    }
}

fn apply_all(matchers: &[Box<dyn Matcher>], line: String, ctx: &mut MatchContext<'_>) -> String {
    matchers.iter().fold(line, |line, m| m.apply(line, ctx))
}
