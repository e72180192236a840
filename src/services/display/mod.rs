mod dry_run;
mod r#trait;
mod xrandr;

pub use self::dry_run::DryRunDisplay;
pub use self::r#trait::{DisplayController, DisplayInspector};
pub use self::xrandr::XrandrDisplay;
