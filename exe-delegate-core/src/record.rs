use serde::{Deserialize, Serialize};

use crate::{DelegateError, Result};

/// Kind tag written into every record.
pub const RECORD_KIND: &str = "exe";

/// Schema version written into every record.
pub const RECORD_VERSION: &str = "1.0";

/// Command description embedded at the tail of a delegate binary.
///
/// Field names on the wire are `Type`, `Version` and `Command`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Must be [`RECORD_KIND`]; records of any other kind are neither
    /// written nor read.
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Version")]
    pub version: String,
    /// Program followed by its fixed arguments.
    #[serde(rename = "Command")]
    pub command: Vec<String>,
}

impl CommandRecord {
    /// Builds a record of the current kind and version.
    pub fn new<I, S>(command: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let record = Self {
            kind: RECORD_KIND.to_string(),
            version: RECORD_VERSION.to_string(),
            command: command.into_iter().map(Into::into).collect(),
        };
        record.validate()?;
        Ok(record)
    }

    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    pub fn fixed_args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }

    /// Unknown versions are accepted; only the kind gates decoding.
    pub fn validate(&self) -> Result<()> {
        if self.kind != RECORD_KIND {
            return Err(DelegateError::UnsupportedKind(self.kind.clone()));
        }
        if self.command.is_empty() {
            return Err(DelegateError::EmptyCommand);
        }
        if self.version != RECORD_VERSION {
            log::debug!("accepting record with version {:?}", self.version);
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(DelegateError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let record: Self = serde_json::from_slice(bytes).map_err(DelegateError::Decode)?;
        record.validate()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wire_field_names() {
        let record = CommandRecord::new(["echo", "a"]).unwrap();
        let json = String::from_utf8(record.encode().unwrap()).unwrap();
        assert_eq!(json, r#"{"Type":"exe","Version":"1.0","Command":["echo","a"]}"#);
    }

    #[test]
    fn decodes_records_written_by_older_tools() {
        let record =
            CommandRecord::decode(br#"{"Type":"exe","Version":"0.9","Command":["ls","-l"]}"#)
                .unwrap();
        assert_eq!(record.version, "0.9");
        assert_eq!(record.program(), "ls");
        assert_eq!(record.fixed_args(), ["-l".to_string()]);
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(
            CommandRecord::new(Vec::<String>::new()),
            Err(DelegateError::EmptyCommand)
        ));
        assert!(matches!(
            CommandRecord::decode(br#"{"Type":"exe","Version":"1.0","Command":[]}"#),
            Err(DelegateError::EmptyCommand)
        ));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = CommandRecord::decode(br#"{"Type":"script","Version":"1.0","Command":["x"]}"#)
            .unwrap_err();
        assert!(matches!(err, DelegateError::UnsupportedKind(kind) if kind == "script"));
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(
            CommandRecord::decode(b"\x00\x01not json"),
            Err(DelegateError::Decode(_))
        ));
    }
}
