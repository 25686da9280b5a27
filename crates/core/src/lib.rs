pub mod dates;
pub mod money;
pub mod record;

pub use dates::{DateFilter, DateSpan};
pub use money::Money;
pub use record::{Record, RecordError};
