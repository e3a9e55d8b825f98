/// Splits caption text into at most `max_lines` display lines.
///
/// Words are packed greedily under `max_chars_per_line` (counted in
/// characters, not bytes). Once the last allowed line is reached, every
/// remaining word is appended to it, so that line may run over the budget
/// but no text is ever dropped.
///
/// Empty or all-whitespace text yields a single empty line.
pub fn wrap(text: &str, max_chars_per_line: usize, max_lines: usize) -> Vec<String> {
    if text.chars().count() <= max_chars_per_line {
        return vec![text.to_string()];
    }
    let max_lines = max_lines.max(1);

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        let on_last_line = lines.len() + 1 >= max_lines;

        if current.is_empty() {
            current.push_str(word);
            current_chars = word_chars;
        } else if on_last_line || current_chars + 1 + word_chars <= max_chars_per_line {
            current.push(' ');
            current.push_str(word);
            current_chars += 1 + word_chars;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_chars = word_chars;
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
