pub mod chrome;
pub mod form;
pub mod form_widget;
pub mod preview_view;
pub mod status_bar;
pub mod tabs;
