pub mod group;
pub mod price;

pub use group::Group;
pub use price::{PriceRecord, Unit};
