pub(crate) mod draw;
pub(crate) mod font;
pub(crate) mod modal;
pub(crate) mod panel_view;
pub(crate) mod popup_view;
