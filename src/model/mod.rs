//! # Family Graph Model
//!
//! Plain DTOs that cross every boundary: store → graph → deriver → caller.
//!
//! Design rule: this module is pure data. No indices, no caching, no state.

pub mod person;
pub mod edge;
pub mod record;

pub use person::{Gender, Person, PersonId};
pub use edge::{EdgeId, EdgeKind, ExtendedKind, RelationEdge};
pub use record::{ConflictRecord, PathKind, RelationshipKind, RelationshipRecord};
