/// Document-level settings.
#[derive(Clone, Debug)]
pub struct DocumentConfig {
    /// Reported as the source URL of lazily compiled attribute listeners.
    pub url: String,
    /// When false no mutation events are dispatched at all, which is the
    /// fast path for documents without listeners.
    pub mutation_events: bool,
    /// Maximum number of characters a parser-created text node holds;
    /// longer runs are spread across adjacent text nodes.
    pub text_length_limit: usize,
}

impl DocumentConfig {
    pub const DEFAULT_TEXT_LENGTH_LIMIT: usize = 65536;
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            mutation_events: true,
            text_length_limit: Self::DEFAULT_TEXT_LENGTH_LIMIT,
        }
    }
}
