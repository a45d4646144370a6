//! Text normalization to keep embeddings compact and payloads tidy.

/// Normalize passage text with minimal layout disruption.
///
/// - Trims trailing whitespace on each line.
/// - Collapses runs of blank lines into a single one and drops leading/trailing blanks.
/// - Stops once `max_chars` bytes would be exceeded, cutting on a char boundary.
pub fn normalize_passage(s: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max_chars));
    let mut pending_blank = false;

    for line in s.lines() {
        let line = line.trim_end();

        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }

        let sep = if out.is_empty() {
            ""
        } else if pending_blank {
            "\n\n"
        } else {
            "\n"
        };
        pending_blank = false;

        if out.len() + sep.len() + line.len() > max_chars {
            let room = max_chars.saturating_sub(out.len() + sep.len());
            if room > 0 {
                out.push_str(sep);
                out.push_str(truncate_on_boundary(line, room));
            }
            break;
        }

        out.push_str(sep);
        out.push_str(line);
    }

    out
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
pub fn truncate_on_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
