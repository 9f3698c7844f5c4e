//! Tracing initialisation for the terminal player.
//!
//! - `LOG_LEVEL` holds `EnvFilter` directives (e.g. `debug` or
//!   `info,session=debug,countdown=warn`).
//! - `LOG_FORMAT=json` switches to structured JSON lines; anything else is the
//!   default human-readable format.
//!
//! Logs go to stderr so they never interleave with the questions on stdout.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,exam_app=info,session=warn,countdown=warn,question_source=info";

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
