//! Output format value object

use serde::{Deserialize, Serialize};

/// How a deliberation is rendered
///
/// This is a domain concept representing how the output should be formatted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Every round, response and assessment
    Full,
    /// Only the final answer (default)
    #[default]
    Synthesis,
    /// The aggregated result as one JSON document
    Json,
    /// One JSON event per line as the turn progresses
    Events,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Full => "full",
            OutputFormat::Synthesis => "synthesis",
            OutputFormat::Json => "json",
            OutputFormat::Events => "events",
        }
    }

    /// Whether this format writes machine-readable output on stdout.
    pub fn is_machine_readable(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Events)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(OutputFormat::Full),
            "synthesis" => Ok(OutputFormat::Synthesis),
            "json" => Ok(OutputFormat::Json),
            "events" | "jsonl" => Ok(OutputFormat::Events),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_synthesis() {
        assert_eq!(OutputFormat::default(), OutputFormat::Synthesis);
    }

    #[test]
    fn test_serialize_lowercase() {
        let json = serde_json::to_string(&OutputFormat::Events).unwrap();
        assert_eq!(json, "\"events\"");
    }

    #[test]
    fn test_deserialize_lowercase() {
        let format: OutputFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, OutputFormat::Json);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Events".parse::<OutputFormat>(), Ok(OutputFormat::Events));
        assert!("xml".parse::<OutputFormat>().is_err());
        assert!(OutputFormat::Json.is_machine_readable());
        assert!(!OutputFormat::Full.is_machine_readable());
    }
}
