mod record;
pub use record::{BuildingEntry, PopEntry, ProvinceRecord};
