//! Process logger setup.
//!
//! `RUST_LOG` wins when set; otherwise the `debug` config flag picks between
//! `debug` and `info`.

use env_logger::{Builder, Env};

pub fn init(debug: bool) {
    let _ = Builder::from_env(Env::default().default_filter_or(default_filter(debug)))
        .format_timestamp_millis()
        .try_init();
}

fn default_filter(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}
