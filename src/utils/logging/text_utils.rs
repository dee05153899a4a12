//! Text wrapping utilities for log formatting

/// Marker that continuation lines keep in front of their first chunk.
const DETAIL_PREFIX: &str = "  -> ";

/// Wraps text at word boundaries so no line exceeds `max_width`. A line that
/// starts with `"  -> "` keeps that prefix on its first wrapped line.
pub fn wrap_text(text: &str, max_width: usize) -> String {
    let mut wrapped_lines = Vec::new();

    for line in text.lines() {
        if line.len() <= max_width {
            wrapped_lines.push(line.to_string());
            continue;
        }

        let (prefix, content) = match line.strip_prefix(DETAIL_PREFIX) {
            Some(stripped) => (DETAIL_PREFIX, stripped),
            None => ("", line),
        };

        let mut current = prefix.to_string();
        let mut current_has_word = false;

        for word in content.split_whitespace() {
            let needed = if current_has_word { word.len() + 1 } else { word.len() };
            if current_has_word && current.len() + needed > max_width {
                wrapped_lines.push(std::mem::take(&mut current));
                current_has_word = false;
            }
            if current_has_word {
                current.push(' ');
            }
            current.push_str(word);
            current_has_word = true;
        }

        if current_has_word {
            wrapped_lines.push(current);
        }
    }

    wrapped_lines.join("\n")
}
