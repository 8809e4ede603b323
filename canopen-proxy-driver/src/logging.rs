//! Process-wide log setup for binaries embedding the proxy.

use std::io::Write;

use chrono::Local;

/// Install `env_logger` with `filter`; `RUST_LOG`, when set, takes precedence.
///
/// Returns `false` if a logger was already installed.
pub fn init(filter: &str) -> bool {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(filter);
    if let Ok(env_filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&env_filter);
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    #[test]
    fn second_install_is_refused() {
        super::init("debug");
        assert!(!super::init("info"));
    }
}
