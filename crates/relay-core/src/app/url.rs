//! URL construction: `{param}` markers and query strings.

use serde_json::{Number, Value};

use crate::domain::MissingParameterError;

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub fn encode_uri_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => {
                out.push('%');
                out.push(hex_digit(byte >> 4));
                out.push(hex_digit(byte & 0x0F));
            }
        }
    }
    out
}

fn hex_digit(nibble: u8) -> char {
    // nibble is always < 16
    char::from_digit(u32::from(nibble), 16)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('0')
}

/// Text form of a serialized scalar.
///
/// Arrays join their elements with `,`; objects render as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Whole floats print without a fractional part (`2.0` -> `2`).
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            // also folds -0 into 0
            format!("{:.0}", f + 0.0)
        }
        _ => n.to_string(),
    }
}

/// Replace every `{name}` with the encoded param value.
///
/// Absent and `null` params are both missing.
pub fn populate_param_markers(
    template: &str,
    params: Option<&Value>,
) -> Result<String, MissingParameterError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            break;
        };
        let name = &after_open[..close];
        if name.is_empty() {
            // `{}` is not a marker
            out.push_str(&rest[..open + 2]);
            rest = &after_open[1..];
            continue;
        }

        let value = params
            .and_then(|p| p.get(name))
            .filter(|v| !v.is_null())
            .ok_or_else(|| MissingParameterError {
                param_name: name.to_string(),
            })?;

        out.push_str(&rest[..open]);
        out.push_str(&encode_uri_component(&stringify(value)));
        rest = &after_open[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Build `k=v&k2[]=a&k2[]=b` in the query map's iteration order.
pub fn make_query_string(query: Option<&Value>) -> String {
    let Some(Value::Object(entries)) = query else {
        return String::new();
    };

    let mut pairs = Vec::new();
    for (key, value) in entries {
        match value {
            Value::Null => continue,
            Value::Array(items) => {
                let encoded_key = encode_uri_component(&format!("{key}[]"));
                for item in items.iter().filter(|v| !v.is_null()) {
                    pairs.push(format!(
                        "{encoded_key}={}",
                        encode_uri_component(&stringify(item))
                    ));
                }
            }
            scalar => pairs.push(format!(
                "{}={}",
                encode_uri_component(key),
                encode_uri_component(&stringify(scalar))
            )),
        }
    }
    pairs.join("&")
}

/// Append a query string with at most one `?`.
pub fn append_query(url: &str, query_string: &str) -> String {
    if query_string.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&{query_string}")
    } else {
        format!("{url}?{query_string}")
    }
}
