//! Truth or Dare: Prompt Catalog and Selector.
//!
//! The catalog is an immutable, startup-resolved collection of prompts tagged
//! by type, gender and level. The selector draws one eligible prompt at a
//! time while honouring an exclusion set.

pub mod catalog;
pub mod selector;

pub use catalog::PromptCatalog;
pub use selector::{PromptQuery, PromptSelector};
