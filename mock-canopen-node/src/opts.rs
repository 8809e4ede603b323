use std::env;
use std::path::PathBuf;

use getopts::{Matches, Options};

#[derive(Debug)]
pub(crate) struct InputFlags {
    pub config: Option<PathBuf>,
    pub node_id: Option<u8>,
    pub log_level: Option<String>,
    pub save_config: bool,
    pub help: bool,
}

fn options() -> Options {
    let mut opts = Options::new();
    opts.optopt("c", "config", "read configuration from FILE", "FILE");
    opts.optopt("n", "node-id", "node ID of the simulated slave", "ID");
    opts.optopt("l", "log-level", "log filter, e.g. debug or canopen_proxy_driver=trace", "FILTER");

    opts.optflag("", "save-config", "write the effective configuration to the user config directory");
    opts.optflag("h", "help", "print this help menu");
    opts
}

pub(crate) fn print_usage() {
    let program = env::args().next().unwrap_or_else(|| "mock-node".to_string());
    let brief = format!("Usage: {} [options]", program);
    print!("{}", options().usage(&brief));
}

impl InputFlags {
    pub fn read() -> Result<Self, String> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::parse(&args)
    }

    fn parse(args: &[String]) -> Result<Self, String> {
        let matches = options().parse(args).map_err(|f| f.to_string())?;

        Ok(InputFlags {
            config: matches.opt_str("c").map(PathBuf::from),
            node_id: node_id(&matches)?,
            log_level: matches.opt_str("l"),
            save_config: matches.opt_present("save-config"),
            help: matches.opt_present("h"),
        })
    }
}

fn node_id(matches: &Matches) -> Result<Option<u8>, String> {
    let Some(raw) = matches.opt_str("n") else {
        return Ok(None);
    };
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    match parsed {
        Ok(id @ 1..=127) => Ok(Some(id)),
        _ => Err(format!("invalid node ID '{}', expected 1..=127", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn accepts_decimal_and_hex_node_ids() {
        let flags = InputFlags::parse(&args(&["--node-id", "0x7F", "-l", "debug"])).unwrap();
        assert_eq!(flags.node_id, Some(127));
        assert_eq!(flags.log_level.as_deref(), Some("debug"));
        assert!(!flags.help);
        assert!(!flags.save_config);

        let flags = InputFlags::parse(&args(&["-n", "4", "--config", "node.toml"])).unwrap();
        assert_eq!(flags.node_id, Some(4));
        assert_eq!(flags.config, Some(PathBuf::from("node.toml")));
    }

    #[test]
    fn rejects_out_of_range_node_ids() {
        assert!(InputFlags::parse(&args(&["--node-id", "0"])).is_err());
        assert!(InputFlags::parse(&args(&["--node-id", "200"])).is_err());
        assert!(InputFlags::parse(&args(&["--bogus"])).is_err());
    }
}
