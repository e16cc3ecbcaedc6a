//! Unitload Sources: where raw unit bytes come from
//!
//! A [`SourceRegistry`] holds an append-only, ordered list of
//! [`ArtifactSource`]s. Looking up a resource path walks the list in insertion
//! order and returns the first hit as an [`ArtifactConnection`].
//!
//! Two sources ship with the crate:
//!
//! - [`DirectorySource`]: plain files under a root directory, no packaging metadata.
//! - [`ArchiveSource`]: a packaged archive with a [`Manifest`] (sealing attributes)
//!   and per-entry ed25519 signatures. Archives live in memory and can be
//!   loaded from a JSON bundle on disk.

pub mod archive;
pub mod directory;
pub mod manifest;
pub mod registry;
pub mod signing;
pub mod source;

pub use archive::{ArchiveBundle, ArchiveSource, BundleEntry};
pub use directory::DirectorySource;
pub use manifest::Manifest;
pub use registry::SourceRegistry;
pub use signing::{EntrySignature, SignatureError};
pub use source::{ArtifactConnection, ArtifactSource, SourceError};
