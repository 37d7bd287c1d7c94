//! Capture, placeholder and restore for verbatim HTML fragments.
//!
//! A parse-time plugin that meets content which must reach the final document
//! unchanged stores it in the [`CaptureStore`] and emits a [`placeholder`]
//! element instead. After post-render plugins have mutated the document,
//! [`CaptureStore::restore_all`] splices the stored content back into the
//! placeholders.
//!
//! The [`markup`] module provides the element index used for restoration and
//! for plugins that need to leave restored regions alone.

pub mod markup;
mod store;

pub use store::{CaptureStore, ID_ATTR, PLACEHOLDER_CLASS, placeholder, placeholder_with_class};
