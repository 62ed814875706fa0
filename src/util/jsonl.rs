//! JSON Lines output
//!
//! Records are written one per line with `", "` and `": "` separators.
//! Non-ASCII characters are written as is.

use serde::Serialize;
use serde_json::ser::Formatter;
use std::io::{self, Write};

/// Compact JSON with a space after each separator
#[derive(Debug, Default, Clone, Copy)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }
}

/// Writes `value` followed by a newline
pub fn write_line<W: Write, T: ?Sized + Serialize>(writer: &mut W, value: &T) -> serde_json::Result<()> {
    let mut serializer = serde_json::Serializer::with_formatter(&mut *writer, SpacedFormatter);
    value.serialize(&mut serializer)?;
    writer.write_all(b"\n").map_err(serde_json::Error::io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_line(value: &serde_json::Value) -> String {
        let mut out = Vec::new();
        write_line(&mut out, value).unwrap();
        String::from_utf8(out).unwrap().trim_end_matches('\n').to_string()
    }

    #[test]
    fn test_separators_have_spaces() {
        let value = json!({ "year": "1996", "tags": [1, 2], "nested": { "a": null } });
        assert_eq!(
            to_line(&value),
            r#"{"year": "1996", "tags": [1, 2], "nested": {"a": null}}"#
        );
    }

    #[test]
    fn test_non_ascii_is_not_escaped() {
        assert_eq!(to_line(&json!({ "title": "Niño" })), r#"{"title": "Niño"}"#);
    }

    #[test]
    fn test_write_line_appends_newline() {
        let mut out = Vec::new();
        write_line(&mut out, &json!({ "url": "u1" })).unwrap();
        write_line(&mut out, &json!([])).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"url\": \"u1\"}\n[]\n");
    }
}
