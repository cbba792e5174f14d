/// A legacy literal tag (`#tag_text`), distinct from the `beginTag`/`endTag`
/// control-command-delimited tags that can contain interpolated content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub text: String,
}

impl Tag {
    pub fn new(text: impl Into<String>) -> Self {
        Tag { text: text.into() }
    }
}
