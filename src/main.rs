// Graphics Presenter - Main Entry Point
//
// Opens a demo window that presents an animated palette test pattern
// through the presenter, with overlay, cursor and OSD hotkeys.

use gfx_presenter::{run_demo, PresenterConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("gfx-presenter v{}", env!("CARGO_PKG_VERSION"));
    println!("==============================");
    println!();
    println!("F9  save screenshot");
    println!("O   toggle overlay");
    println!("M   show a message");
    println!("A   toggle aspect ratio correction");
    println!("N/L nearest / linear filtering");
    println!("I   toggle activity icon");
    println!();

    let config = PresenterConfig::load_or_default();
    run_demo(config)?;

    println!("Display window closed.");
    Ok(())
}
