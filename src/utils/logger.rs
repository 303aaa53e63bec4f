use colored::{Color, Colorize};
use env_logger::Builder;
use log::Level;
use std::io::Write;

/// Colors for the run summary.
pub struct Colors;

impl Colors {
    pub const RECORDS: Color = Color::Green;
    pub const SKIPPED: Color = Color::Yellow;
    pub const DUPLICATES: Color = Color::Cyan;

    pub fn colorize(color: Color, text: &str) -> String {
        text.color(color).to_string()
    }
}

/// Init env_logger: our crate at Debug (verbose) or Info, dependencies at Warn. `RUST_LOG` still applies.
/// Warnings and errors carry the thread name so worker reports can be told apart.
pub fn setup_logging(verbose: bool) {
    use log::LevelFilter;

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME");
            let line = match record.level() {
                Level::Error | Level::Warn => {
                    let level_str = match record.level() {
                        Level::Warn => "WARN".yellow(),
                        _ => "ERROR".red(),
                    };
                    let thread = std::thread::current();
                    let origin = thread.name().unwrap_or("main").white();
                    format!("[{} {} {}] {}", name.cyan(), level_str, origin, record.args())
                }
                Level::Debug | Level::Trace => {
                    format!("[{} {}] {}", name.cyan(), "debug".dimmed(), record.args())
                }
                _ => format!("[{}] {}", name.cyan(), record.args()),
            };
            writeln!(buf, "{}", line)
        })
        .try_init();
}
