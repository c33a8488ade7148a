//! Linearized Document Model
//!
//! An element tree flattened into a position-ordered token sequence:
//! - `token`   - one row per element boundary or text run
//! - `flatten` - tree to tokens and back
//! - `table`   - ordered storage and the splice primitives
//! - `query`   - ancestor, context, range and pointer lookups
//! - `edit`    - inline insertion and removal
//! - `view`    - element structure as the tokens describe it

pub mod edit;
pub mod flatten;
pub mod query;
pub mod table;
pub mod token;
pub mod view;

pub use flatten::{flatten, rebuild, Rebuilt};
pub use table::{TokenPatch, TokenTable};
pub use token::{Token, TokenKind, TokenRecord};
pub use view::TableView;
