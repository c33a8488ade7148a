//! linearized-xml - XML documents addressed by plain-text position
//!
//! Layers:
//! - `dom`: arena tree parsed and serialized with quick-xml
//! - `linear`: token table (Open/Close/Empty/Text) with flatten and rebuild,
//!   position queries and inline edits
//! - `pointer`: `path::offset` pointers and the path subset they use
//! - `standoff`: TEI stand-off annotations, taxonomies and conversion to
//!   inline markup
//!
//! [`LinearizedDocument`] ties them together.

pub mod config;
pub mod dom;
pub mod error;
pub mod linear;
pub mod linearized;
pub mod pointer;
pub mod standoff;

// ============================================================================
// Public API
// ============================================================================

pub use config::Options;
pub use dom::{Document, DocumentAccess, NodeId};
pub use error::{Error, Result};
pub use linear::{flatten, rebuild, Rebuilt, TableView, Token, TokenKind, TokenPatch, TokenTable};
pub use linearized::LinearizedDocument;
pub use pointer::Pointer;
pub use standoff::{StandoffAnnotation, Tag, TagSpec};
