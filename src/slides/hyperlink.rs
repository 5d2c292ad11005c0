/*!
 * Hyperlink filter.
 *
 * A paragraph is excluded from translation when any of its runs carries a click
 * hyperlink that points somewhere: a non-empty relationship id or a non-empty
 * external address. A probe that cannot be completed counts as a link.
 */

use log::{info, warn};

use crate::deck::{relationship_id, Paragraph, Relationships, Run};
use crate::errors::HyperlinkProbeError;

/// What a run's hyperlink points to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HyperlinkTarget {
    pub relationship_id: String,
    pub address: String,
}

impl HyperlinkTarget {
    pub fn is_navigable(&self) -> bool {
        !self.relationship_id.is_empty() || !self.address.is_empty()
    }
}

/// Probe one run. `Ok(None)` means the run has no click hyperlink.
pub fn probe_run(
    run: &Run<'_>,
    relationships: &Relationships,
) -> Result<Option<HyperlinkTarget>, HyperlinkProbeError> {
    let Some(click) = run.hyperlink_click() else {
        return Ok(None);
    };

    // Jumps inside the deck (next slide, etc.) have an action but no relationship
    let Some(relationship_id) = relationship_id(click) else {
        return Ok(Some(HyperlinkTarget::default()));
    };
    if relationship_id.is_empty() {
        return Ok(Some(HyperlinkTarget::default()));
    }
    if relationship_id.trim() != relationship_id {
        return Err(HyperlinkProbeError::MalformedAttribute(format!(
            "relationship id '{}' has surrounding whitespace",
            relationship_id
        )));
    }

    let relationship = relationships
        .get(&relationship_id)
        .ok_or_else(|| HyperlinkProbeError::DanglingRelationship(relationship_id.clone()))?;
    let address = if relationship.external {
        relationship.target.clone()
    } else {
        String::new()
    };

    Ok(Some(HyperlinkTarget {
        relationship_id,
        address,
    }))
}

/// Whether the paragraph must be left untranslated because of a hyperlink
pub fn has_hyperlink(paragraph: &Paragraph<'_>, relationships: &Relationships) -> bool {
    paragraph.runs().iter().any(|run| match probe_run(run, relationships) {
        Ok(Some(target)) => target.is_navigable(),
        Ok(None) => false,
        Err(e) => {
            warn!("Hyperlink probe failed, treating run as linked: {}", e);
            true
        }
    })
}

/// Log a paragraph left untranslated because of its hyperlink
pub fn log_skipped(text: &str) {
    info!("Skipping hyperlinked text: {}", text.trim());
}
