pub mod format_util;
pub mod quantity_util;
