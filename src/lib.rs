pub mod app;
pub mod artwork;
pub mod overlay;
pub mod poller;
pub mod source;
pub mod theme;
pub mod ui;
