//! Immutable prompt collection loaded once at startup.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use truthdare_core::error::DomainError;
use truthdare_core::model::{Gender, Level, Prompt, PromptId, PromptType};

const BUILTIN_CATALOG: &str = include_str!("../data/prompts.yaml");

/// On-disk catalog layout.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    prompts: Vec<Prompt>,
}

/// The full set of prompts available to a session.
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    prompts: Vec<Prompt>,
    index: HashMap<PromptId, usize>,
}

impl PromptCatalog {
    /// Builds a catalog from already-parsed prompts.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a prompt has an empty id or text,
    /// or if two prompts share an id.
    pub fn from_prompts(prompts: Vec<Prompt>) -> Result<Self, DomainError> {
        let mut index = HashMap::with_capacity(prompts.len());
        for (position, prompt) in prompts.iter().enumerate() {
            if prompt.id.as_str().trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "prompt at position {position} has an empty id"
                )));
            }
            if prompt.text.trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "prompt {} has empty text",
                    prompt.id
                )));
            }
            if index.insert(prompt.id.clone(), position).is_some() {
                return Err(DomainError::Validation(format!(
                    "duplicate prompt id {}",
                    prompt.id
                )));
            }
        }
        Ok(Self { prompts, index })
    }

    /// Parses a YAML document of the form `prompts: [{ id, text, type, gender, level }]`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the document is malformed or
    /// fails the checks of [`PromptCatalog::from_prompts`].
    pub fn from_yaml(source: &str) -> Result<Self, DomainError> {
        let file: CatalogFile = serde_yaml::from_str(source)
            .map_err(|e| DomainError::Validation(format!("invalid catalog document: {e}")))?;
        Self::from_prompts(file.prompts)
    }

    /// Reads and parses a YAML catalog file.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the file cannot be read and
    /// `DomainError::Validation` if its content is invalid.
    pub fn load(path: &Path) -> Result<Self, DomainError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Infrastructure(format!("cannot read catalog {}: {e}", path.display()))
        })?;
        Self::from_yaml(&source)
    }

    /// The starter catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the embedded document is invalid.
    pub fn builtin() -> Result<Self, DomainError> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Looks a prompt up by id.
    #[must_use]
    pub fn get(&self, id: &PromptId) -> Option<&Prompt> {
        self.index.get(id).map(|&position| &self.prompts[position])
    }

    /// Number of prompts in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Whether the catalog holds no prompts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Prompts tagged with exactly this type, gender and level, in catalog order.
    pub fn matching(
        &self,
        prompt_type: PromptType,
        gender: Gender,
        level: Level,
    ) -> impl Iterator<Item = &Prompt> {
        self.prompts.iter().filter(move |prompt| {
            prompt.prompt_type == prompt_type && prompt.gender == gender && prompt.level == level
        })
    }
}
