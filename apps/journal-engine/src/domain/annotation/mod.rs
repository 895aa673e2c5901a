//! Journal annotations: the locally-owned half of a trade.
//!
//! The broker never sees these fields. A record is created on the first edit
//! (or the first successful enrichment) and is never deleted automatically, so
//! it survives any number of ledger resyncs.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// User-owned fields attached to a trade id.
///
/// Sets are ordered so that serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// Setup label (e.g. "breakout").
    #[serde(default)]
    pub setup: String,
    /// Mistake label.
    #[serde(default)]
    pub mistake: String,
    /// Emotion / psychology label.
    #[serde(default)]
    pub emotion: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Strategy rules the trader followed on this trade.
    #[serde(default)]
    pub followed_rules: BTreeSet<String>,
    /// Pinned initial stop-loss; once set it is treated as truth.
    #[serde(default)]
    pub initial_stop_loss: Option<Decimal>,
}

impl AnnotationRecord {
    /// An empty record whose pinned stop is the given best guess.
    #[must_use]
    pub fn with_default_stop(stop: Option<Decimal>) -> Self {
        Self {
            initial_stop_loss: stop,
            ..Self::default()
        }
    }
}

/// A partial update to an [`AnnotationRecord`].
///
/// Only the fields that are `Some` are written; everything else on the
/// existing record is left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationPatch {
    /// New notes.
    pub notes: Option<String>,
    /// New setup label.
    pub setup: Option<String>,
    /// New mistake label.
    pub mistake: Option<String>,
    /// New emotion label.
    pub emotion: Option<String>,
    /// Replacement tag set.
    pub tags: Option<BTreeSet<String>>,
    /// Replacement followed-rules set.
    pub followed_rules: Option<BTreeSet<String>>,
    /// New pinned initial stop-loss.
    pub initial_stop_loss: Option<Decimal>,
}

impl AnnotationPatch {
    /// Set notes.
    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set the setup label.
    #[must_use]
    pub fn setup(mut self, setup: impl Into<String>) -> Self {
        self.setup = Some(setup.into());
        self
    }

    /// Set the mistake label.
    #[must_use]
    pub fn mistake(mut self, mistake: impl Into<String>) -> Self {
        self.mistake = Some(mistake.into());
        self
    }

    /// Set the emotion label.
    #[must_use]
    pub fn emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = Some(emotion.into());
        self
    }

    /// Replace the tag set.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the followed-rules set.
    #[must_use]
    pub fn followed_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.followed_rules = Some(rules.into_iter().map(Into::into).collect());
        self
    }

    /// Pin the initial stop-loss.
    #[must_use]
    pub const fn initial_stop_loss(mut self, stop: Decimal) -> Self {
        self.initial_stop_loss = Some(stop);
        self
    }

    /// Whether the patch writes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.notes.is_none()
            && self.setup.is_none()
            && self.mistake.is_none()
            && self.emotion.is_none()
            && self.tags.is_none()
            && self.followed_rules.is_none()
            && self.initial_stop_loss.is_none()
    }

    /// Merge the patch into an existing record.
    pub fn apply_to(self, record: &mut AnnotationRecord) {
        if let Some(notes) = self.notes {
            record.notes = notes;
        }
        if let Some(setup) = self.setup {
            record.setup = setup;
        }
        if let Some(mistake) = self.mistake {
            record.mistake = mistake;
        }
        if let Some(emotion) = self.emotion {
            record.emotion = emotion;
        }
        if let Some(tags) = self.tags {
            record.tags = tags;
        }
        if let Some(rules) = self.followed_rules {
            record.followed_rules = rules;
        }
        if let Some(stop) = self.initial_stop_loss {
            record.initial_stop_loss = Some(stop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn patch_only_touches_given_fields() {
        let mut record = AnnotationRecord {
            notes: "old".to_string(),
            setup: "breakout".to_string(),
            ..AnnotationRecord::default()
        };

        AnnotationPatch::default()
            .notes("new")
            .tags(["fomo"])
            .apply_to(&mut record);

        assert_eq!(record.notes, "new");
        assert_eq!(record.setup, "breakout");
        assert!(record.tags.contains("fomo"));
        assert_eq!(record.initial_stop_loss, None);
    }

    #[test]
    fn patch_pins_stop() {
        let mut record = AnnotationRecord::default();
        AnnotationPatch::default()
            .initial_stop_loss(dec!(1.0950))
            .apply_to(&mut record);
        assert_eq!(record.initial_stop_loss, Some(dec!(1.0950)));
    }

    #[test]
    fn empty_patch_detected() {
        assert!(AnnotationPatch::default().is_empty());
        assert!(!AnnotationPatch::default().emotion("calm").is_empty());
    }

    #[test]
    fn record_wire_format_is_camel_case() {
        let record = AnnotationRecord {
            followed_rules: ["wait for close".to_string()].into(),
            initial_stop_loss: Some(dec!(1.0950)),
            ..AnnotationRecord::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("followedRules").is_some());
        assert_eq!(json["initialStopLoss"], "1.0950");
    }

    #[test]
    fn record_accepts_numeric_stop_and_missing_fields() {
        let record: AnnotationRecord =
            serde_json::from_str(r#"{"notes":"n","initialStopLoss":1.095}"#).unwrap();
        assert_eq!(record.notes, "n");
        assert_eq!(record.initial_stop_loss, Some(dec!(1.095)));
        assert!(record.tags.is_empty());
    }
}
