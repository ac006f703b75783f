//! Identifier newtypes.
//!
//! `ObjectId` names a world object for the lifetime of a run.  `VertexId` and
//! `EdgeId` are positions inside one `RoadGraph` and mean nothing outside the
//! graph (or route tree) that issued them.

use std::fmt;

macro_rules! index_id {
    ($(#[$attr:meta])* $name:ident, $prefix:literal) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u32);

        impl $name {
            /// Placeholder for slots not filled yet.
            pub const INVALID: $name = $name(u32::MAX);

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!($prefix, "{}"), self.0)
                } else {
                    f.write_str(concat!($prefix, "?"))
                }
            }
        }
    };
}

index_id! {
    /// Agent or stationary object in the world.
    ObjectId, "#"
}

index_id! {
    VertexId, "v"
}

index_id! {
    /// Directed edge; edges leaving one vertex have consecutive ids.
    EdgeId, "e"
}
