//! Unitload Stages: reference transformer stages.
//!
//! Small, deterministic stages that cover the common load-time patches.
//! Hosts with bespoke rewrites implement `TransformerStage` themselves and
//! register a factory next to these.
//!
//! | kind | effect |
//! |---|---|
//! | `byte_patch` | replace every occurrence of a byte pattern |
//! | `append_trailer` | append fixed bytes |
//! | `prefix_remap` | pass-through; exposes a prefix `NameRemapper` |
//! | `deny_list` | reject units by name prefix |

mod byte_patch;
mod definition;
mod deny_list;
mod prefix_remap;

pub use byte_patch::{AppendTrailerStage, BytePatchStage};
pub use definition::{register_definitions, StageDefinition, StageKind};
pub use deny_list::DenyListStage;
pub use prefix_remap::PrefixRemapStage;
