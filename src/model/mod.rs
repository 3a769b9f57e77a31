//! # Entity Model
//!
//! Plain data that crosses every boundary: store ↔ search ↔ resolver ↔ caller.
//!
//! Design rule: no store handles and no converters here.
//! This module is pure data — no I/O, no state.

pub mod entity;
pub mod value;
pub mod property_map;
pub mod context;

pub use entity::{Entity, EntityId, Endpoint, Endpoints, TYPE_KEY};
pub use value::{Value, FromValue};
pub use property_map::PropertyMap;
pub use context::SecurityContext;
