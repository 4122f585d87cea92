//! Verbosity configuration combining info and debug levels.

use super::levels::{DebugFlag, DebugLevels, InfoFlag, InfoLevels};

/// Combined verbosity configuration for info and debug flags.
#[derive(Clone, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Info flag levels.
    pub info: InfoLevels,
    /// Debug flag levels.
    pub debug: DebugLevels,
}

impl VerbosityConfig {
    /// Create a new configuration from a verbose level (the `-v` count).
    ///
    /// Level 0 is silent, level 1 enables listing and stats, level 2 adds
    /// dispatch info and coarse debug output, and each further level raises
    /// the debug flags by one.
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();

        match level {
            0 => {}
            1 => {
                config.info.list = 1;
                config.info.stats = 1;
            }
            2 => {
                config.info.set_all(1);
                config.info.list = 2;
                config.debug.walk = 1;
                config.debug.device = 1;
            }
            3 => {
                config.info.set_all(2);
                config.debug.set_all(1);
                config.debug.walk = 2;
            }
            _ => {
                // Level 4+
                config.info.set_all(2);
                config.debug.set_all(level - 2);
            }
        }

        config
    }

    /// Apply a single info flag token (e.g., "list2", "stats").
    pub fn apply_info_flag(&mut self, token: &str) -> Result<(), String> {
        let (name, level) = parse_flag_token(token)?;

        let flag = match name {
            "dispatch" => InfoFlag::Dispatch,
            "list" => InfoFlag::List,
            "stats" => InfoFlag::Stats,
            _ => return Err(format!("unknown info flag: {name}")),
        };

        self.info.set(flag, level);
        Ok(())
    }

    /// Apply a single debug flag token (e.g., "walk2", "stop").
    pub fn apply_debug_flag(&mut self, token: &str) -> Result<(), String> {
        let (name, level) = parse_flag_token(token)?;

        let flag = match name {
            "device" => DebugFlag::Device,
            "stop" => DebugFlag::Stop,
            "stream" => DebugFlag::Stream,
            "transform" => DebugFlag::Transform,
            "walk" => DebugFlag::Walk,
            _ => return Err(format!("unknown debug flag: {name}")),
        };

        self.debug.set(flag, level);
        Ok(())
    }

    /// Apply a comma-separated `--info` list such as `"list2,stats"`.
    ///
    /// The keywords `ALL` and `NONE` (any case) set every info flag to 1 or 0.
    /// On error the configuration is left unchanged.
    pub fn apply_info_list(&mut self, list: &str) -> Result<(), String> {
        let mut config = self.clone();
        match keyword_level(list) {
            Some(level) => config.info.set_all(level),
            None => {
                for token in tokens(list) {
                    config.apply_info_flag(token)?;
                }
            }
        }
        *self = config;
        Ok(())
    }

    /// Apply a comma-separated `--debug` list such as `"walk2,stop"`.
    ///
    /// The keywords `ALL` and `NONE` (any case) set every debug flag to 1 or 0.
    /// On error the configuration is left unchanged.
    pub fn apply_debug_list(&mut self, list: &str) -> Result<(), String> {
        let mut config = self.clone();
        match keyword_level(list) {
            Some(level) => config.debug.set_all(level),
            None => {
                for token in tokens(list) {
                    config.apply_debug_flag(token)?;
                }
            }
        }
        *self = config;
        Ok(())
    }
}

fn keyword_level(list: &str) -> Option<u8> {
    let list = list.trim();
    if list.eq_ignore_ascii_case("ALL") {
        Some(1)
    } else if list.eq_ignore_ascii_case("NONE") {
        Some(0)
    } else {
        None
    }
}

fn tokens(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|token| !token.is_empty())
}

/// Parse a flag token like "walk2" into ("walk", 2) or "stop" into ("stop", 1).
fn parse_flag_token(token: &str) -> Result<(&str, u8), String> {
    if token.is_empty() {
        return Err("empty flag token".to_string());
    }

    match token.find(|c: char| c.is_ascii_digit()) {
        Some(0) => Err(format!("missing flag name in: {token}")),
        Some(pos) => {
            let level = token[pos..]
                .parse::<u8>()
                .map_err(|_| format!("invalid level in flag: {token}"))?;
            Ok((&token[..pos], level))
        }
        None => Ok((token, 1)),
    }
}
