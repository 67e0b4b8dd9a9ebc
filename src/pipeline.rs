// Deck pipeline: rows -> records -> card drawings -> pages

use std::io::BufRead;

use crate::assets::AssetSource;
use crate::card_type::TypeRegistry;
use crate::config::{AssetPolicy, EngineConfig};
use crate::error::DeckError;
use crate::frame::CardFrameRenderer;
use crate::pager::{GridPager, PageSink};
use crate::record::parse_row;
use crate::text::TextMeasurer;

/// Counts reported after a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cards: usize,
    pub pages: u32,
    /// Blank, separator or too-short rows
    pub skipped_rows: usize,
    /// Cards dropped because an asset was missing (skip policy only)
    pub skipped_cards: usize,
}

pub struct DeckPipeline<'a> {
    registry: &'a TypeRegistry,
    renderer: CardFrameRenderer<'a>,
    header_rows: usize,
    asset_policy: AssetPolicy,
}

impl<'a> DeckPipeline<'a> {
    pub fn new(
        config: &EngineConfig,
        registry: &'a TypeRegistry,
        measurer: &'a dyn TextMeasurer,
        assets: &'a dyn AssetSource,
    ) -> Result<Self, DeckError> {
        Ok(Self {
            registry,
            renderer: CardFrameRenderer::new(config, measurer, assets)?,
            header_rows: config.header_rows,
            asset_policy: config.asset_policy,
        })
    }

    /// Process rows strictly in order. Fatal errors return before the
    /// partial page is flushed, so the sink only ever holds complete pages.
    pub fn run<R: BufRead>(
        &self,
        input: R,
        sink: &mut dyn PageSink,
    ) -> Result<RunSummary, DeckError> {
        let mut pager = GridPager::new(*self.renderer.geometry());
        let mut summary = RunSummary::default();

        for (index, row) in input.lines().enumerate() {
            let line = index + 1;
            let row = row.map_err(|e| DeckError::Input(format!("line {}: {}", line, e)))?;
            if index < self.header_rows {
                continue;
            }

            let card = match parse_row(&row, line, self.registry) {
                Ok(card) => card,
                Err(e) if e.is_recoverable() => {
                    log::debug!("Skipping row: {}", e);
                    summary.skipped_rows += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match self.renderer.render(&card) {
                Ok(drawing) => {
                    pager.push(drawing, sink)?;
                    summary.cards += 1;
                }
                Err(source) if self.asset_policy == AssetPolicy::Skip => {
                    log::warn!("Skipping card on line {}: {}", line, source);
                    summary.skipped_cards += 1;
                }
                Err(source) => return Err(DeckError::CardAsset { line, source }),
            }
        }

        summary.pages = pager.finish(sink)?;
        log::info!(
            "Laid out {} cards on {} pages ({} rows skipped, {} cards skipped)",
            summary.cards,
            summary.pages,
            summary.skipped_rows,
            summary.skipped_cards
        );
        Ok(summary)
    }

    pub fn run_str(&self, input: &str, sink: &mut dyn PageSink) -> Result<RunSummary, DeckError> {
        self.run(input.as_bytes(), sink)
    }
}
