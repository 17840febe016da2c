//! Markup emitted around skeletons and fill-ins.
//!
//! A boundary renders as a host `<div>` holding a declarative shadow root
//! (the skeleton). Placeholders are named `<slot>` elements inside the shadow
//! root; fill-ins are light-DOM children of the host carrying a `slot`
//! attribute, so the browser moves each one into its placeholder.

use slotted_core::RenderConfig;

/// Opening tag of a boundary's host element.
pub const CONTAINER_OPEN: &str = "<div>";
/// Closing tag of a boundary's host element.
pub const CONTAINER_CLOSE: &str = "</div>";
/// Opening tag of the skeleton region.
pub const SKELETON_OPEN: &str = r#"<template shadowrootmode="open">"#;
/// Closing tag of the skeleton region.
pub const SKELETON_CLOSE: &str = "</template>";

/// Slot naming for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    slot_prefix: String,
}

impl Markup {
    /// Create markup with a slot name prefix.
    ///
    /// The prefix is written into attribute values verbatim; check untrusted
    /// prefixes with [`RenderConfig::validate`] first.
    pub fn new(slot_prefix: impl Into<String>) -> Self {
        Self {
            slot_prefix: slot_prefix.into(),
        }
    }

    /// Create markup from a render configuration.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.slot_prefix.clone())
    }

    /// Name of a slot.
    pub fn slot_name(&self, slot: usize) -> String {
        format!("{}{}", self.slot_prefix, slot)
    }

    /// Placeholder reserving a slot in a skeleton.
    pub fn placeholder(&self, slot: usize) -> String {
        format!(r#"<slot name="{}"></slot>"#, self.slot_name(slot))
    }

    /// Forward a parent slot into a child boundary's slot.
    ///
    /// The element is a placeholder in the parent's slot space that is
    /// itself assigned to the child's placeholder.
    pub fn forward(&self, parent_slot: usize, child_slot: usize) -> String {
        format!(
            r#"<slot name="{}" slot="{}"></slot>"#,
            self.slot_name(parent_slot),
            self.slot_name(child_slot)
        )
    }

    /// Fill-in fragment carrying the resolved text of a slot.
    pub fn fill_in(&self, slot: usize, text: &str) -> String {
        format!(r#"<div slot="{}">{}</div>"#, self.slot_name(slot), text)
    }
}

impl Default for Markup {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}
