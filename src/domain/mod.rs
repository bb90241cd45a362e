pub mod availability;
pub mod calendar;
pub mod classifier;
pub mod date_range;
pub mod month_grid;
pub mod pricing;
pub mod selection;
pub mod store;

pub use availability::*;
pub use calendar::*;
pub use classifier::*;
pub use date_range::*;
pub use month_grid::*;
pub use pricing::*;
pub use selection::*;
pub use store::*;
