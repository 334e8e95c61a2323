//! AGI wire format: environment block and response lines

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use taxi_agent_core::{Error, Result};

/// Session environment the host sends before the first command
///
/// A block of `key: value` lines terminated by an empty line, e.g.
/// `agi_uniqueid`, `agi_extension`, `agi_callerid`.
#[derive(Debug, Clone, Default)]
pub struct AgiEnv {
    variables: HashMap<String, String>,
}

impl AgiEnv {
    /// Parse one header line into the environment; returns `false` for the
    /// terminating empty line.
    pub fn push_line(&mut self, line: &str) -> bool {
        let line = line.trim_end();
        if line.is_empty() {
            return false;
        }
        if let Some((key, value)) = line.split_once(':') {
            self.variables
                .insert(key.trim().to_string(), value.trim().to_string());
        }
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|s| s.as_str())
    }

    /// Call-unique id assigned by the host
    pub fn unique_id(&self) -> &str {
        self.get("agi_uniqueid").unwrap_or("unknown")
    }

    /// Dialed extension (the exchange key)
    pub fn extension(&self) -> &str {
        self.get("agi_extension").unwrap_or("")
    }

    /// Caller number with any `<...>` decoration stripped
    pub fn caller_number(&self) -> String {
        self.get("agi_callerid")
            .unwrap_or("")
            .replace(['<', '>'], "")
            .trim()
            .to_string()
    }

    /// Withheld/unusable caller ids are blocked at init
    pub fn is_anonymous_caller(&self) -> bool {
        is_anonymous_number(&self.caller_number())
    }
}

/// Withheld/unusable caller-id check, shared with the flow layer
pub fn is_anonymous_number(number: &str) -> bool {
    let num = number.to_lowercase();
    num.is_empty() || num == "anonymous" || num == "unknown" || num.len() <= 5
}

static RESULT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{3}) result=(-?\d+)(?:\s*\((.*)\))?").expect("static pattern"));

/// One parsed response line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgiResponse {
    pub code: u16,
    pub result: i64,
    /// Parenthesized payload, e.g. a variable value
    pub data: Option<String>,
}

impl AgiResponse {
    /// Parse a response line.
    ///
    /// An unsolicited `HANGUP` line and end-of-stream both surface as
    /// [`Error::Hangup`]; so does `result=-1`, which the host emits when the
    /// channel died under a command. This check runs on every response, not
    /// just at loop boundaries.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case("HANGUP") {
            return Err(Error::Hangup);
        }
        let caps = RESULT_RE
            .captures(line)
            .ok_or_else(|| Error::Channel(format!("unparseable response: {line}")))?;
        let code: u16 = caps[1].parse().map_err(|_| {
            Error::Channel(format!("bad response code: {line}"))
        })?;
        let result: i64 = caps[2]
            .parse()
            .map_err(|_| Error::Channel(format!("bad result value: {line}")))?;
        if result == -1 {
            return Err(Error::Hangup);
        }
        if code != 200 {
            return Err(Error::Channel(format!("command failed: {line}")));
        }
        Ok(Self {
            code,
            result,
            data: caps.get(3).map(|m| m.as_str().to_string()),
        })
    }
}
