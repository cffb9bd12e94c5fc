pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{change, dim, error, header, info, section, success, uri, warn};
pub use progress::Spinner;
pub use table::{routes_table, row_set_table};
pub use theme::{err_theme, theme, Theme};
