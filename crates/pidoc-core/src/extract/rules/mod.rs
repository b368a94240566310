//! Field-level extraction rules shared by the parsing strategies.

pub mod currency;
pub mod dates;
pub mod numbers;
pub mod patterns;
pub mod positions;
pub mod temperature;

pub use currency::{detect_currency, normalize_currency};
pub use dates::{extract_date_token, format_date, parse_date};
pub use numbers::{format_amount, parse_amount};
pub use positions::extract_rows;
pub use temperature::{extract_storage_phrase, parse_temperature};
