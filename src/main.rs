//! Thin binary wrapper.
//!
//! Run:
//! - `cargo run`                  (empty window; press `O` or drop a file)
//! - `cargo run -- drawing.svg`   (open a document at startup)

fn main() -> anyhow::Result<()> {
    // Keep logging setup in the binary so the library remains unopinionated.
    env_logger::init();

    let config = linescope::AppConfig {
        initial_file: std::env::args_os().nth(1).map(Into::into),
        ..Default::default()
    };
    linescope::run_app_with(config)
}
