use shared_types::ExtractionError;

/// Locate `marker` in `source` and return the first balanced JSON object after it.
///
/// Braces inside string literals (including escaped quotes) are ignored.
pub fn find_embedded_json<'a>(source: &'a str, marker: &str) -> Result<&'a str, ExtractionError> {
    let marker_pos = source
        .find(marker)
        .ok_or_else(|| ExtractionError::MarkerNotFound(marker.to_string()))?;

    let after_marker = &source[marker_pos + marker.len()..];
    let open = after_marker.find('{').ok_or_else(|| {
        ExtractionError::StructureNotFound(format!("no JSON object after {marker}"))
    })?;

    balanced_object(&after_marker[open..]).ok_or_else(|| {
        ExtractionError::StructureNotFound(format!("unterminated JSON object after {marker}"))
    })
}

// Byte-wise scan is safe: the delimiters are ASCII and never occur inside
// multi-byte UTF-8 sequences.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, byte) in text.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
