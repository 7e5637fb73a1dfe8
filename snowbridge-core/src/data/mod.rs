mod value;
mod r#type;

pub use value::*;
pub use r#type::*;

pub use chrono;
pub use chrono_tz;
pub use rust_decimal;
