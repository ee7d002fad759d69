//! Non-repeating prompt selection.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use truthdare_core::model::{Gender, Level, Prompt, PromptId, PromptType};
use truthdare_core::rng::DeterministicRng;

use crate::catalog::PromptCatalog;

/// Tags a drawn prompt must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptQuery {
    pub prompt_type: PromptType,
    pub gender: Gender,
    pub level: Level,
}

/// Draws prompts from an injected catalog.
#[derive(Debug, Clone)]
pub struct PromptSelector {
    catalog: Arc<PromptCatalog>,
}

impl PromptSelector {
    /// Creates a selector over `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<PromptCatalog>) -> Self {
        Self { catalog }
    }

    /// The catalog this selector draws from.
    #[must_use]
    pub fn catalog(&self) -> &PromptCatalog {
        &self.catalog
    }

    fn eligible<'a>(
        &'a self,
        query: &PromptQuery,
        excluded: &'a HashSet<PromptId>,
    ) -> impl Iterator<Item = &'a Prompt> {
        self.catalog
            .matching(query.prompt_type, query.gender, query.level)
            .filter(move |prompt| !excluded.contains(&prompt.id))
    }

    /// Picks one prompt matching `query` whose id is not in `excluded`,
    /// uniformly at random, or `None` when nothing eligible remains.
    pub fn select(
        &self,
        query: &PromptQuery,
        excluded: &HashSet<PromptId>,
        rng: &mut dyn DeterministicRng,
    ) -> Option<Prompt> {
        let candidates: Vec<&Prompt> = self.eligible(query, excluded).collect();
        if candidates.is_empty() {
            debug!(
                prompt_type = %query.prompt_type,
                gender = %query.gender,
                level = %query.level,
                "no eligible prompt"
            );
            return None;
        }
        let picked = candidates[rng.next_index(candidates.len())];
        debug!(prompt_id = %picked.id, remaining = candidates.len() - 1, "prompt drawn");
        Some(picked.clone())
    }

    /// Number of prompts `select` could still return for `query`.
    #[must_use]
    pub fn remaining(&self, query: &PromptQuery, excluded: &HashSet<PromptId>) -> usize {
        self.eligible(query, excluded).count()
    }
}
