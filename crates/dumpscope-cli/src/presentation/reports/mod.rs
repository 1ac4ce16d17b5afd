mod tabs;
mod validate;
mod view;

pub use tabs::TabList;
pub use validate::{FileReport, ValidationReport};
pub use view::ViewReport;
