/// Splits text into pieces small enough for one translation call
///
/// Text of at most `max_chars` characters is returned as a single piece.
/// Longer text is split into paragraphs on blank lines, and each paragraph
/// into runs of whole sentences of at most `max_chars` characters. A single
/// sentence longer than the limit is kept whole.
///
/// The result holds one entry per non-blank paragraph, each listing that
/// paragraph's chunks in order.
///
/// # Examples
///
/// ```
/// use doc_harvest::translate::split_for_translation;
///
/// let parts = split_for_translation("One. Two.\n\nThree.", 6);
/// assert_eq!(parts, vec![vec!["One.".to_string(), "Two.".to_string()], vec!["Three.".to_string()]]);
/// ```
pub fn split_for_translation(text: &str, max_chars: usize) -> Vec<Vec<String>> {
    if text.chars().count() <= max_chars {
        return vec![vec![text.to_string()]];
    }

    text.split("\n\n")
        .filter(|paragraph| !paragraph.trim().is_empty())
        .map(|paragraph| chunk_sentences(paragraph, max_chars))
        .collect()
}

fn chunk_sentences(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences(paragraph) {
        let len = sentence.chars().count();
        if current_len + len > max_chars && !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
            current.clear();
            current_len = 0;
        }
        current.push_str(sentence);
        current_len += len;
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks
}

/// Splits after each `.`, `!` or `?` that is followed by whitespace,
/// keeping that whitespace with the sentence
fn sentences(paragraph: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut prev_terminal = false;

    for (idx, c) in paragraph.char_indices() {
        if prev_terminal && c.is_whitespace() {
            let end = idx + c.len_utf8();
            result.push(&paragraph[start..end]);
            start = end;
        }
        prev_terminal = matches!(c, '.' | '!' | '?');
    }

    if start < paragraph.len() {
        result.push(&paragraph[start..]);
    }
    result
}
