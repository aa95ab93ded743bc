pub mod normalize;
pub mod short_code;
pub mod shortener;

pub use normalize::normalize_url;
pub use short_code::{random_code, ShortCodeService};
pub use shortener::{Issuance, LinkStats, ShortenerService, ShortenerSettings};
