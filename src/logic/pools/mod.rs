pub mod pool;
pub mod venue;

pub use pool::{BPS_DENOMINATOR, PoolSnapshot, constant_product_amount_out};
pub use venue::{Venue, VenueClass, VenueKind};
