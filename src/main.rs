mod app;
mod components;
mod config;
mod css;
mod expenses;
mod field_config;
mod logging;
mod model;
mod panels;
mod preview;
mod services;
mod session;
mod settings;
mod store;
mod theme;
mod ui;
mod widgets;

use anyhow::Result;

fn main() -> Result<()> {
    ui::run()
}
