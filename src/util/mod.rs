//! Crate-internal helpers: logging macros and markup escaping.

use std::borrow::Cow;

/// Logs at debug level when the `logging` feature is enabled.
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

/// Logs at trace level when the `logging` feature is enabled.
#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

pub(crate) use log_debug;
pub(crate) use log_trace;

/// Escapes character data for use between tags.
///
/// `>` is escaped as well so a literal `]]>` never appears in output.
pub(crate) fn escape_text(text: &str) -> Cow<'_, str> {
    escape(text, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    })
}

/// Escapes an unescaped attribute value for a `"`-delimited literal.
pub(crate) fn escape_attribute(value: &str) -> Cow<'_, str> {
    escape(value, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#9;"),
        '\n' => Some("&#10;"),
        '\r' => Some("&#13;"),
        _ => None,
    })
}

/// Prepares a raw attribute value (references intact) for a `"`-delimited
/// literal. Only the delimiter itself needs replacing.
pub(crate) fn quote_raw_attribute(raw: &str) -> Cow<'_, str> {
    escape(raw, |c| (c == '"').then_some("&quot;"))
}

fn escape(input: &str, replace: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    let Some(first) = input.find(|c| replace(c).is_some()) else {
        return Cow::Borrowed(input);
    };
    let mut out = String::with_capacity(input.len() + 8);
    out.push_str(&input[..first]);
    for c in input[first..].chars() {
        match replace(c) {
            Some(entity) => out.push_str(entity),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert!(matches!(escape_text("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(escape_attribute("say \"hi\"\n"), "say &quot;hi&quot;&#10;");
        assert_eq!(escape_attribute("it's"), "it's");
    }

    #[test]
    fn test_quote_raw_attribute_keeps_references() {
        assert_eq!(quote_raw_attribute("&amp; \"x\""), "&amp; &quot;x&quot;");
    }
}
