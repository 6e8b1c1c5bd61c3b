//! The model is asked for a list of questions; these helpers pull the
//! individual questions out of its free-form reply.

/// One question per non-empty line, with list markers removed.
pub fn parse_questions(text: &str) -> Vec<String> {
    text.lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove a leading `-`, `*`, `•`, `1.` or `1)` marker followed by whitespace.
fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();

    for bullet in ['-', '*', '•'] {
        if let Some(rest) = line.strip_prefix(bullet)
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            return rest.trim_start();
        }
    }

    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        let after_digits = &line[digits..];
        if let Some(rest) = after_digits
            .strip_prefix('.')
            .or_else(|| after_digits.strip_prefix(')'))
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            return rest.trim_start();
        }
    }

    line
}
