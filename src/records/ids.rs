//! Newtype IDs for the records joined by the matcher.
//!
//! Bounding-box rows and image rows are joined on `image_id`; keeping the
//! three ID kinds distinct stops an annotation ID from being used as a join
//! key by accident.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            #[inline]
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self::new(id)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of an image record; the join key between the two sources.
    ImageId
);

record_id!(
    /// Identifier of a single bounding-box record.
    AnnotationId
);

record_id!(
    /// 1-based category identifier from the source taxonomy.
    CategoryId
);

impl CategoryId {
    /// Returns the 0-based YOLO class index for this category.
    ///
    /// `None` for category 0, which has no slot in a 1-based taxonomy.
    #[inline]
    pub fn class_index(&self) -> Option<usize> {
        self.0.checked_sub(1).map(|idx| idx as usize)
    }
}
