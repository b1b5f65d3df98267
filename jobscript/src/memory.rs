use std::fmt;
use std::str::FromStr;

use combine::parser::char::{char, digit, spaces};
use combine::parser::range::{recognize, take_while};
use combine::{eof, optional, skip_many1, Parser};
use serde_json::Value;

use crate::MalformedDescriptor;

/// A memory requirement in megabytes. Always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemoryMb(u64);

impl MemoryMb {
    /// Used when a job script doesn't specify any memory.
    pub const DEFAULT: MemoryMb = MemoryMb(10_000);

    pub fn new(mb: u64) -> Option<Self> {
        (mb >= 1).then_some(Self(mb))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Interpret a json resource value: numbers are megabytes,
    /// strings may carry a unit suffix.
    pub fn from_json(value: &Value) -> Result<Self, MalformedDescriptor> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .and_then(|mb| from_scaled(mb, 1.0))
                .ok_or_else(|| MalformedDescriptor::InvalidMemory(n.to_string())),
            Value::String(s) => s.parse(),
            other => Err(MalformedDescriptor::InvalidMemory(other.to_string())),
        }
    }
}

impl Default for MemoryMb {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for MemoryMb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemoryMb {
    type Err = MalformedDescriptor;

    /// Parse e.g. `16000`, `8000M`, `8G`, `1.5 GiB`. A bare number is megabytes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MalformedDescriptor::InvalidMemory(s.to_owned());
        let ((number, unit), _) = quantity().parse(s).map_err(|_| invalid())?;
        let value: f64 = number.parse().map_err(|_| invalid())?;
        let factor = unit_factor(unit).ok_or_else(invalid)?;
        from_scaled(value, factor).ok_or_else(invalid)
    }
}

// megabytes per unit. decimal units follow the workflow engine's
// convention, binary units treat MiB as the scheduler's megabyte.
fn unit_factor(unit: &str) -> Option<f64> {
    let factor = match unit.to_ascii_uppercase().as_str() {
        "" | "M" | "MB" | "MIB" => 1.0,
        "K" | "KB" => 1.0 / 1000.0,
        "KIB" => 1.0 / 1024.0,
        "G" | "GB" => 1000.0,
        "GIB" => 1024.0,
        "T" | "TB" => 1_000_000.0,
        "TIB" => 1024.0 * 1024.0,
        _ => return None,
    };
    Some(factor)
}

fn from_scaled(value: f64, factor: f64) -> Option<MemoryMb> {
    let mb = (value * factor).ceil();
    if mb.is_finite() && mb >= 1.0 && mb <= u64::MAX as f64 {
        MemoryMb::new(mb as u64)
    } else {
        None
    }
}

// a decimal number followed by an optional alphabetic unit:
fn quantity<'a>() -> impl Parser<&'a str, Output = (&'a str, &'a str)> {
    let number = recognize((
        skip_many1(digit()),
        optional((char('.'), skip_many1(digit()))),
    ));
    let unit = take_while(|c: char| c.is_ascii_alphabetic());
    (spaces(), number, spaces(), unit, spaces(), eof())
        .map(|(_, number, _, unit, _, _)| (number, unit))
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;

    fn mb(s: &str) -> u64 {
        s.parse::<MemoryMb>().unwrap().get()
    }

    #[test]
    fn test_quantity() -> Result<()> {
        assert_eq!(("8", "G"), quantity().parse("8G").unwrap().0);
        assert_eq!(("1.5", "GiB"), quantity().parse(" 1.5 GiB ").unwrap().0);
        assert_eq!(("16000", ""), quantity().parse("16000").unwrap().0);
        assert!(quantity().parse("G8").is_err());
        assert!(quantity().parse("8 G B").is_err());
        assert!(quantity().parse("12.").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(16000, mb("16000"));
        assert_eq!(8000, mb("8000M"));
        assert_eq!(8000, mb("8000mb"));
        assert_eq!(8000, mb("8G"));
        assert_eq!(8000, mb("8GB"));
        assert_eq!(8192, mb("8GiB"));
        assert_eq!(1536, mb("1.5 GiB"));
        assert_eq!(2_000_000, mb("2T"));
        assert_eq!(1, mb("500K"));
        assert_eq!(2, mb("1025KiB"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<MemoryMb>().is_err());
        assert!("lots".parse::<MemoryMb>().is_err());
        assert!("8 parsecs".parse::<MemoryMb>().is_err());
        assert!("0".parse::<MemoryMb>().is_err());
        assert!("-5G".parse::<MemoryMb>().is_err());
    }

    #[test]
    fn test_from_json() -> Result<()> {
        assert_eq!(8000, MemoryMb::from_json(&Value::from(8000))?.get());
        assert_eq!(1, MemoryMb::from_json(&Value::from(0.5))?.get());
        assert_eq!(4000, MemoryMb::from_json(&Value::from("4G"))?.get());
        assert!(MemoryMb::from_json(&Value::from(0)).is_err());
        assert!(MemoryMb::from_json(&Value::from(true)).is_err());
        assert_eq!(10_000, MemoryMb::default().get());
        Ok(())
    }
}
