//! Output records
//!
//! Normalized reviews and the entity records assembled from them.

mod entity;
mod review;

pub use entity::{
    Award, EntityDetail, EntityRecord, LocationDetail, LodgingExtras, OpeningRange, PlaceDetail,
    PlaceExtras, PlaceholderRecord, RatingHistogram, RentalDetail, RestaurantExtras, ReviewTags,
};
pub use review::{Author, Review};
pub(crate) use review::lenient_u64;
