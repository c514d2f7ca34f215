// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod canvas;
pub mod config;
pub mod glyphs;
pub mod input;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod text_bank;
pub mod trail;
pub mod ui;
