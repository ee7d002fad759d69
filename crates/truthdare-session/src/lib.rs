//! Truth or Dare: Session & Progression.
//!
//! Responsible for turn rotation, per-level completion tracking, level
//! gating, prompt drawing and the snapshot/record persistence of a session.

pub mod application;
pub mod domain;
