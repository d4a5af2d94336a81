//! Caption composition.

/// Builds outgoing captions from the entry caption, an optional
/// `(i/total)` page marker and an optional fixed signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionComposer {
    signature: Option<String>,
}

impl CaptionComposer {
    /// Composer appending `signature` to every caption; blank signatures are ignored
    #[must_use]
    pub fn new(signature: Option<String>) -> Self {
        Self {
            signature: signature.filter(|s| !s.trim().is_empty()),
        }
    }

    /// Configured signature, if any
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Compose the caption for page `index` (1-based) of a `total`-page range.
    ///
    /// The marker is only added when `total > 1`. Returns `None` when there is
    /// nothing to say.
    #[must_use]
    pub fn compose(&self, base: Option<&str>, index: u32, total: u32) -> Option<String> {
        let base = base.map(str::trim).filter(|b| !b.is_empty());

        let body = match (base, total > 1) {
            (Some(text), true) => Some(format!("{text} ({index}/{total})")),
            (None, true) => Some(format!("({index}/{total})")),
            (Some(text), false) => Some(text.to_string()),
            (None, false) => None,
        };

        self.sign(body)
    }

    /// Caption for a grouped message: no page marker, since the group shows the set
    #[must_use]
    pub fn compose_group(&self, base: Option<&str>) -> Option<String> {
        self.compose(base, 1, 1)
    }

    fn sign(&self, body: Option<String>) -> Option<String> {
        match (body, self.signature.as_deref()) {
            (Some(body), Some(sig)) => Some(format!("{body}\n\n{sig}")),
            (None, Some(sig)) => Some(sig.to_string()),
            (body, None) => body,
        }
    }
}
