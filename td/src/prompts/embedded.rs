//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

pub const CLASSIFY_SYSTEM: &str = include_str!("../../prompts/classify-system.pmt");
pub const CLASSIFY: &str = include_str!("../../prompts/classify.pmt");
pub const DECOMPOSE_SYSTEM: &str = include_str!("../../prompts/decompose-system.pmt");
pub const DECOMPOSE: &str = include_str!("../../prompts/decompose.pmt");
pub const RESOURCES_SYSTEM: &str = include_str!("../../prompts/resources-system.pmt");
pub const RESOURCES: &str = include_str!("../../prompts/resources.pmt");
pub const RISKS_SYSTEM: &str = include_str!("../../prompts/risks-system.pmt");
pub const RISKS: &str = include_str!("../../prompts/risks.pmt");
pub const TIMELINE_SYSTEM: &str = include_str!("../../prompts/timeline-system.pmt");
pub const TIMELINE: &str = include_str!("../../prompts/timeline.pmt");
pub const SUGGEST_SYSTEM: &str = include_str!("../../prompts/suggest-system.pmt");
pub const SUGGEST: &str = include_str!("../../prompts/suggest.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    let found = match name {
        "classify-system" => CLASSIFY_SYSTEM,
        "classify" => CLASSIFY,
        "decompose-system" => DECOMPOSE_SYSTEM,
        "decompose" => DECOMPOSE,
        "resources-system" => RESOURCES_SYSTEM,
        "resources" => RESOURCES,
        "risks-system" => RISKS_SYSTEM,
        "risks" => RISKS,
        "timeline-system" => TIMELINE_SYSTEM,
        "timeline" => TIMELINE,
        "suggest-system" => SUGGEST_SYSTEM,
        "suggest" => SUGGEST,
        _ => {
            debug!("get_embedded: no match found");
            return None;
        }
    };
    Some(found)
}
