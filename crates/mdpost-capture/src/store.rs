//! Out-of-band storage for content that must survive the pipeline verbatim.

use std::collections::{BTreeMap, HashSet};
use std::ops::Range;
use std::sync::{Mutex, PoisonError};

use crate::markup::{self, escape_attr};

/// Class carried by every capture placeholder.
pub const PLACEHOLDER_CLASS: &str = "mdpost-capture";

/// Attribute naming the capture entry a placeholder stands for.
pub const ID_ATTR: &str = "data-id";

/// Placeholder element for capture `id`.
///
/// Post-render plugins treat its inner content as opaque; restoration fills it
/// with the stored raw content.
#[must_use]
pub fn placeholder(id: &str) -> String {
    placeholder_with_class(id, "")
}

/// Placeholder element carrying an extra class next to [`PLACEHOLDER_CLASS`].
#[must_use]
pub fn placeholder_with_class(id: &str, class: &str) -> String {
    let class = if class.is_empty() {
        PLACEHOLDER_CLASS.to_owned()
    } else {
        format!("{PLACEHOLDER_CLASS} {}", escape_attr(class))
    };
    format!(
        r#"<section class="{class}" {ID_ATTR}="{}"></section>"#,
        escape_attr(id)
    )
}

/// Keyed map from capture id to raw content.
///
/// Shared by the plugin that captures during parsing and the plugin that
/// restores after post-render mutation. The host clears it between
/// independent render passes.
#[derive(Debug, Default)]
pub struct CaptureStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl CaptureStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `raw` under `id`, replacing any previous entry.
    pub fn put(&self, id: impl Into<String>, raw: impl Into<String>) {
        let id = id.into();
        let previous = self.lock().insert(id.clone(), raw.into());
        if previous.is_some() {
            tracing::debug!(id = %id, "capture overwritten");
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<String> {
        self.lock().get(id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Replace the inner content of every element whose `data-id` names a
    /// stored entry with that entry's raw content.
    ///
    /// Elements are located through an index of element spans, so only the
    /// targeted inner ranges change and the rest of `html` is kept byte for
    /// byte. The first element per id wins; nested targets inside an already
    /// restored element are skipped. Ids without a matching element, and
    /// placeholders without a stored entry, are logged and skipped.
    ///
    /// Entries are not consumed: restoring the same html twice gives the same
    /// result.
    #[must_use]
    pub fn restore_all(&self, html: &str) -> String {
        let entries = self.lock().clone();
        let elements = markup::scan_elements(html);

        let mut targets: Vec<(Range<usize>, &str)> = Vec::new();
        let mut matched: HashSet<&str> = HashSet::new();
        for element in &elements {
            let Some(id) = element.attr(ID_ATTR) else {
                continue;
            };
            if let Some((key, raw)) = entries.get_key_value(id) {
                if matched.insert(key.as_str()) {
                    targets.push((element.inner.clone(), raw.as_str()));
                } else {
                    tracing::warn!(id, "duplicate capture target, keeping the first");
                }
            } else if element.has_class(PLACEHOLDER_CLASS) {
                tracing::error!(id, "capture placeholder has no stored content");
            }
        }

        for id in entries.keys().filter(|id| !matched.contains(id.as_str())) {
            tracing::error!(id = %id, "no placeholder found for captured content");
        }

        targets.sort_by_key(|(range, _)| range.start);

        let extra: usize = targets.iter().map(|(_, raw)| raw.len()).sum();
        let mut out = String::with_capacity(html.len() + extra);
        let mut cursor = 0;
        for (range, raw) in targets {
            if range.start < cursor {
                tracing::warn!("nested capture target skipped");
                continue;
            }
            out.push_str(&html[cursor..range.start]);
            out.push_str(raw);
            cursor = range.end;
        }
        out.push_str(&html[cursor..]);

        tracing::debug!(restored = matched.len(), total = entries.len(), "captures restored");
        out
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
