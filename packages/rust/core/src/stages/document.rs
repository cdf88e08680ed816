use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use pitchlens_document::{DocumentSource, extract_key_phrases};
use pitchlens_shared::{
    ExtractedPitchDeck, RecordField, RecordUpdate, ResearchRecord, Result, StageStatus,
};

use crate::collaborators::DocumentExtractor;
use crate::stage::Stage;

/// Key phrases kept per deck.
pub const MAX_KEY_PHRASES: usize = 15;

const PAGE_MARKER: &str = "--- Page";

/// Pulls text and key phrases out of the pitch deck.
///
/// Text supplied with the request wins over an uploaded file, which wins
/// over a URL.
pub struct ExtractDocument {
    extractor: Arc<dyn DocumentExtractor>,
}

impl ExtractDocument {
    pub fn new(extractor: Arc<dyn DocumentExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Stage for ExtractDocument {
    fn name(&self) -> &'static str {
        "extract-document"
    }

    fn reads(&self) -> &'static [RecordField] {
        &[RecordField::Input, RecordField::PitchDeckInput]
    }

    fn writes(&self) -> &'static [RecordField] {
        &[RecordField::PitchDeck]
    }

    async fn run(&self, record: &ResearchRecord) -> Result<RecordUpdate> {
        let deck = record.pitch_deck_input();

        let provided = deck.text.as_deref().filter(|t| !t.trim().is_empty());
        let url = deck.url.as_deref().map(str::trim).filter(|u| !u.is_empty());

        let (text, pages) = if let Some(text) = provided {
            (text.to_string(), None)
        } else {
            let source = match (&deck.file_path, url) {
                (Some(path), _) => DocumentSource::Path(path),
                (None, Some(url)) => DocumentSource::Url(url),
                (None, None) => {
                    info!("no pitch deck supplied");
                    return Ok(RecordUpdate::skip(StageStatus::NoPitchDeck));
                }
            };

            match self.extractor.extract(source).await {
                Ok(doc) => (doc.full_text, Some(doc.pages)),
                Err(e) => {
                    warn!(error = %e, "pitch deck extraction failed");
                    return Ok(RecordUpdate::failed(
                        StageStatus::PitchDeckFailed,
                        format!("Pitch deck extraction failed: {e}"),
                    ));
                }
            }
        };

        let page_count = pages
            .unwrap_or_else(|| text.matches(PAGE_MARKER).count())
            .max(1);
        let key_points = extract_key_phrases(&text, MAX_KEY_PHRASES);
        info!(chars = text.len(), page_count, key_points = key_points.len(), "pitch deck parsed");

        let mut update = RecordUpdate::new(StageStatus::PitchDeckParsed);
        update.pitch_deck = Some(ExtractedPitchDeck {
            raw_text: text,
            key_points,
            page_count,
        });
        Ok(update)
    }
}
