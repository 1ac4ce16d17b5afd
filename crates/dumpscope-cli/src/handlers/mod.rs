pub mod tabs;
pub mod validate;
pub mod view;
