/// One entry in the ordered output stream (§3, §4.5). `BeginString` and
/// `BeginTag` are markers left in the stream until their matching `End*`
/// control command collapses everything after them into a single
/// `Value`/`LiteralTag` entry.
#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Text(String),
    Glue,
    BeginTag,
    LiteralTag(String),
    BeginString,
}

/// Ordered sequence of text, tags, glue markers, and control markers that
/// `Story` assembles into `current_text`/`current_tags` (§4.5). Owned
/// per-flow, so each `Flow` has its own stream (§4.8).
#[derive(Debug, Clone, Default)]
pub struct OutputStream {
    entries: Vec<Entry>,
}

impl OutputStream {
    pub fn new() -> Self {
        OutputStream {
            entries: Vec::new(),
        }
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.entries.push(Entry::Text(text));
        }
    }

    pub fn push_glue(&mut self) {
        self.entries.push(Entry::Glue);
    }

    pub fn push_literal_tag(&mut self, text: impl Into<String>) {
        self.entries.push(Entry::LiteralTag(text.into()));
    }

    pub fn begin_tag(&mut self) {
        self.entries.push(Entry::BeginTag);
    }

    /// Collapses everything back to the most recent `BeginTag` into one
    /// `LiteralTag` entry (§4.2 `endTag`).
    pub fn end_tag(&mut self) {
        if let Some(start) = self
            .entries
            .iter()
            .rposition(|e| matches!(e, Entry::BeginTag))
        {
            let collected = self.entries.split_off(start + 1);
            self.entries.truncate(start);
            self.entries
                .push(Entry::LiteralTag(render_segment(&collected)));
        }
    }

    pub fn begin_string(&mut self) {
        self.entries.push(Entry::BeginString);
    }

    /// Collapses everything back to the most recent `BeginString` and
    /// returns it as a plain string, removing those entries from the
    /// stream (§4.2 `endString`).
    pub fn end_string(&mut self) -> String {
        if let Some(start) = self
            .entries
            .iter()
            .rposition(|e| matches!(e, Entry::BeginString))
        {
            let collected = self.entries.split_off(start + 1);
            self.entries.truncate(start);
            render_segment(&collected)
        } else {
            String::new()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn tag_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Entry::LiteralTag(_)))
            .count()
    }

    /// The assembled, glue-resolved, whitespace-trimmed text (§4.5).
    pub fn current_text(&self) -> String {
        let raw = render_segment(&self.entries);
        collapse_whitespace(&raw)
    }

    pub fn current_tags(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Entry::LiteralTag(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Text produced since entry index `start`, the per-call counterpart to
    /// `current_text`: `Story` uses this to report only the current line's
    /// delta while the stream itself keeps the whole story's history.
    pub fn text_since(&self, start: usize) -> String {
        let start = start.min(self.entries.len());
        let raw = render_segment(&self.entries[start..]);
        collapse_whitespace(&raw)
    }

    pub fn tags_since(&self, start: usize) -> Vec<String> {
        let start = start.min(self.entries.len());
        self.entries[start..]
            .iter()
            .filter_map(|e| match e {
                Entry::LiteralTag(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn ends_in_newline(&self) -> bool {
        self.current_text().ends_with('\n')
    }
}

/// Concatenates a run of entries, resolving glue: trailing whitespace
/// before a glue marker and leading whitespace after it are trimmed, but
/// only once confirmed that non-whitespace content actually follows. A
/// glue with nothing after it (the story ends right there) leaves
/// whatever came before it untouched — it has nothing to glue to.
fn render_segment(entries: &[Entry]) -> String {
    let mut out = String::new();
    let mut pending_glue = false;
    let mut glue_trim_len: Option<usize> = None;

    for entry in entries {
        match entry {
            Entry::Glue => {
                if glue_trim_len.is_none() {
                    glue_trim_len = Some(trailing_inline_whitespace_trimmed_len(&out));
                }
                pending_glue = true;
            }
            Entry::Text(text) => {
                let mut slice = text.as_str();
                if pending_glue {
                    slice = slice.trim_start_matches([' ', '\t']);
                    if !slice.is_empty() {
                        if let Some(len) = glue_trim_len.take() {
                            out.truncate(len);
                        }
                        pending_glue = false;
                    }
                }
                out.push_str(slice);
            }
            Entry::LiteralTag(_) | Entry::BeginTag | Entry::BeginString => {}
        }
    }

    out
}

/// Length `s` would have after trimming trailing space/tab/newline —
/// computed without mutating, since the trim may end up never applied.
fn trailing_inline_whitespace_trimmed_len(s: &str) -> usize {
    s.trim_end_matches([' ', '\t', '\n']).len()
}

/// Applies the stream-level invariants (§3, §4.5): leading whitespace
/// right after a newline (or at stream start) is trimmed, and consecutive
/// newlines collapse to one.
fn collapse_whitespace(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut at_line_start = true;
    let mut last_was_newline = false;

    for c in raw.chars() {
        if at_line_start && (c == ' ' || c == '\t') {
            continue;
        }
        if c == '\n' {
            if last_was_newline {
                continue;
            }
            result.push('\n');
            last_was_newline = true;
            at_line_start = true;
            continue;
        }
        at_line_start = false;
        last_was_newline = false;
        result.push(c);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glue_trims_surrounding_whitespace() {
        let mut stream = OutputStream::new();
        stream.push_text("Hello ");
        stream.push_glue();
        stream.push_text(" world");
        assert_eq!(stream.current_text(), "Helloworld");
    }

    #[test]
    fn leading_whitespace_after_newline_is_trimmed() {
        let mut stream = OutputStream::new();
        stream.push_text("line one\n   line two");
        assert_eq!(stream.current_text(), "line one\nline two");
    }

    #[test]
    fn consecutive_newlines_collapse() {
        let mut stream = OutputStream::new();
        stream.push_text("a\n\n\nb");
        assert_eq!(stream.current_text(), "a\nb");
    }

    #[test]
    fn end_tag_collects_inclusive_content() {
        let mut stream = OutputStream::new();
        stream.push_text("before ");
        stream.begin_tag();
        stream.push_text("author: jane");
        stream.end_tag();
        stream.push_text(" after");
        assert_eq!(stream.current_text(), "before  after");
        assert_eq!(stream.current_tags(), vec!["author: jane".to_string()]);
    }

    #[test]
    fn glue_cancels_a_preceding_newline() {
        let mut stream = OutputStream::new();
        stream.push_text("left\n");
        stream.push_glue();
        stream.push_text("right");
        assert_eq!(stream.current_text(), "leftright");
    }

    #[test]
    fn trailing_glue_with_nothing_after_it_leaves_the_newline() {
        let mut stream = OutputStream::new();
        stream.push_text("left\n");
        stream.push_glue();
        assert_eq!(stream.current_text(), "left\n");
    }

    #[test]
    fn text_since_only_reports_the_requested_window() {
        let mut stream = OutputStream::new();
        stream.push_text("first\n");
        let mark = stream.len();
        stream.push_text("second\n");
        assert_eq!(stream.text_since(mark), "second\n");
    }

    #[test]
    fn end_string_returns_and_removes_content() {
        let mut stream = OutputStream::new();
        stream.begin_string();
        stream.push_text("captured");
        let result = stream.end_string();
        assert_eq!(result, "captured");
        assert_eq!(stream.current_text(), "");
    }
}
