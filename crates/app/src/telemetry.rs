//! Tracing setup for the binary.
//!
//! `QUIZ_LOG` holds the filter directives (default `info`); `QUIZ_LOG_FORMAT=json`
//! switches to JSON lines. Logs go to stderr so they never mix with chat output.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUIZ_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match std::env::var("QUIZ_LOG_FORMAT").as_deref() {
        Ok("json") => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}
