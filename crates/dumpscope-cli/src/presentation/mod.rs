// Presentation layer
//
// Handlers build serializable report values and wrap them in a
// `CommandResultViewModel`. The renderer prints either the JSON form or the
// console form; report types never print on their own.

pub mod format;
pub mod renderer;
pub mod reports;
pub mod result;

pub use renderer::{ConsoleRenderer, ConsoleView, Style};
pub use reports::{FileReport, TabList, ValidationReport, ViewReport};
pub use result::{CommandResultViewModel, Guidance, StatusBadge, StatusLevel};
