use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{info, warn};
use std::collections::HashMap;

use anyhow::{Result, anyhow};

use crate::errors::ProviderError;
use crate::providers::Translator;
use crate::subtitle_processor::{SubtitleEntry, SubtitleTrack};

// @module: Translation path resolution and per-segment translation routing

/// Delimiter used for the naive sentence split before translation
const SENTENCE_DELIMITER: &str = ". ";

/// Mapping from internal ISO 639-1 codes to the external model naming scheme
const MODEL_CODES: &[(&str, &str)] = &[
    ("en", "en"),
    ("he", "heb"),
    ("es", "es"),
    ("fr", "fr"),
    ("de", "de"),
    ("ru", "ru"),
    ("it", "it"),
    ("ar", "ar"),
    ("zh", "zh"),
    ("ja", "jap"),
    ("ko", "kor"),
];

/// Resolved route from a source language to a target language.
///
/// Most pairs translate through a single external model; pairs without a
/// direct model chain two hops through a pivot language. Paths are a pure
/// function of the language pair and are never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationPath {
    /// Single hop through one external model
    Direct {
        /// External model name, e.g. `Helsinki-NLP/opus-mt-en-he`
        model: String,
    },
    /// Two hops through an intermediate language
    Pivot {
        /// Route from source to the pivot language
        first: Box<TranslationPath>,
        /// Route from the pivot language to the target
        second: Box<TranslationPath>,
    },
}

/// Map an internal language code to the external scheme, passing unknown
/// codes through unchanged
fn external_code(code: &str) -> &str {
    MODEL_CODES
        .iter()
        .find(|(internal, _)| *internal == code)
        .map(|(_, external)| *external)
        .unwrap_or(code)
}

/// External model name for a direct hop
fn direct_model_name(source: &str, target: &str) -> String {
    format!("Helsinki-NLP/opus-mt-{}-{}", external_code(source), external_code(target))
}

/// Resolve the translation path for a language pair.
///
/// Hebrew is only reachable directly from English; every other source pivots
/// through English first. The pivot legs reuse this same resolution, so a
/// deeper chain is possible if a leg itself has no direct model (not
/// exercised by the default language set).
pub fn resolve_path(source: &str, target: &str) -> Result<TranslationPath> {
    if source == target {
        return Err(anyhow!("No translation path from a language to itself: {}", source));
    }

    if target == "he" && source != "en" {
        return Ok(TranslationPath::Pivot {
            first: Box::new(resolve_path(source, "en")?),
            second: Box::new(resolve_path("en", target)?),
        });
    }

    Ok(TranslationPath::Direct {
        model: direct_model_name(source, target),
    })
}

/// Routes subtitle tracks through the external translation capability.
///
/// Segment-level failures degrade to the original text; only a whole-target
/// failure (no resolvable path) drops a track.
pub struct TranslationRouter<'a> {
    /// External translation capability
    translator: &'a dyn Translator,
}

impl<'a> TranslationRouter<'a> {
    /// Create a router over the given translator
    pub fn new(translator: &'a dyn Translator) -> Self {
        TranslationRouter { translator }
    }

    /// Translate one segment's text along a resolved path.
    ///
    /// Never fails: any model or tokenization error for this segment logs a
    /// warning and yields the original untranslated text.
    pub async fn translate_segment(&self, text: &str, path: &TranslationPath) -> String {
        match self.translate_via(text, path).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Translation error, keeping original text: {}", e);
                text.to_string()
            }
        }
    }

    /// Follow a path, propagating errors for the caller to recover from
    async fn translate_via(&self, text: &str, path: &TranslationPath) -> Result<String, ProviderError> {
        match path {
            TranslationPath::Direct { model } => {
                let mut translated_parts = Vec::new();
                for sentence in text.split(SENTENCE_DELIMITER) {
                    if sentence.trim().is_empty() {
                        continue;
                    }
                    translated_parts.push(self.translator.translate(sentence, model).await?);
                }
                Ok(translated_parts.join(SENTENCE_DELIMITER))
            }
            TranslationPath::Pivot { first, second } => {
                let intermediate = Box::pin(self.translate_via(text, first)).await?;
                Box::pin(self.translate_via(&intermediate, second)).await
            }
        }
    }

    /// Translate a track into every requested target language.
    ///
    /// Targets equal to the source are skipped (no track emitted). A target
    /// whose path cannot be resolved is logged and omitted; the remaining
    /// targets still complete. Indices and time ranges pass through
    /// unchanged.
    pub async fn translate_track(
        &self,
        track: &SubtitleTrack,
        source: &str,
        targets: &[String],
        multi_progress: Option<&MultiProgress>,
    ) -> HashMap<String, SubtitleTrack> {
        let mut results = HashMap::new();

        for target in targets {
            if target == source {
                info!("Skipping translation to {} (same as source language)", target);
                continue;
            }

            let path = match resolve_path(source, target) {
                Ok(path) => path,
                Err(e) => {
                    warn!("No translation path for {} -> {}: {}", source, target, e);
                    continue;
                }
            };

            let bar = multi_progress.map(|mp| {
                let bar = mp.add(ProgressBar::new(track.entries.len() as u64));
                bar.set_style(
                    ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar.set_message(format!("Translating to {}", target));
                bar
            });

            let mut translated_entries = Vec::with_capacity(track.entries.len());
            for entry in &track.entries {
                let text = self.translate_segment(&entry.text, &path).await;
                translated_entries.push(SubtitleEntry {
                    seq_num: entry.seq_num,
                    start_time_ms: entry.start_time_ms,
                    end_time_ms: entry.end_time_ms,
                    text,
                });
                if let Some(bar) = &bar {
                    bar.inc(1);
                }
            }

            if let Some(bar) = bar {
                bar.finish_and_clear();
            }

            results.insert(
                target.clone(),
                SubtitleTrack::with_entries(target.clone(), translated_entries),
            );
        }

        results
    }
}
