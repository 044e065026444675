//! Bar frequencies understood by the host.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Minute1,
    Minute5,
    Minute15,
    Minute30,
    Minute60,
    Hour4,
    Day1,
    Week1,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Minute1 => "1m",
            Frequency::Minute5 => "5m",
            Frequency::Minute15 => "15m",
            Frequency::Minute30 => "30m",
            Frequency::Minute60 => "60m",
            Frequency::Hour4 => "4h",
            Frequency::Day1 => "1d",
            Frequency::Week1 => "1w",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Frequency::Minute1),
            "5m" => Ok(Frequency::Minute5),
            "15m" => Ok(Frequency::Minute15),
            "30m" => Ok(Frequency::Minute30),
            "60m" => Ok(Frequency::Minute60),
            "4h" => Ok(Frequency::Hour4),
            "1d" => Ok(Frequency::Day1),
            "1w" => Ok(Frequency::Week1),
            other => Err(format!("unknown frequency '{}'", other)),
        }
    }
}
