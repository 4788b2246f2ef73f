mod app;
mod config;
mod render;
mod sim;

use anyhow::Result;

fn main() -> Result<()> {
    let cfg = config::parse_args();
    app::run(cfg)
}
