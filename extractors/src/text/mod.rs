//! Pure functions turning loosely formatted tariff text into quantities.

mod embedded_json;
mod markup;
mod quantity;

pub use embedded_json::find_embedded_json;
pub use markup::{clean_fragment, normalize_spaces, strip_tags, unescape_html};
pub use quantity::{extract_data_volume, extract_minutes, extract_price};
