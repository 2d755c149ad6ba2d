//! Strongly-typed identifiers used across the engine.
//!
//! Downstream crates should *not* use raw integers for IDs.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! new_id {
    ($name:ident, $repr:ty) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name($repr);

        impl $name {
            pub const fn new(v: $repr) -> Self {
                Self(v)
            }
            pub const fn get(self) -> $repr {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

new_id!(PageId, u32);
new_id!(SlotId, u16);

/// Physical address of a stored record inside one relation.
///
/// Only meaningful for the relation that produced it; carries no ordering
/// semantics beyond storage position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    pub page: PageId,
    pub slot: SlotId,
}

impl RecordId {
    pub const fn new(page: PageId, slot: SlotId) -> Self {
        Self { page, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rid({}:{})", self.page.get(), self.slot.get())
    }
}
