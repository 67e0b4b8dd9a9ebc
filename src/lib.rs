//! Lays out a deck of playing cards onto printable pages.
//!
//! Tab-separated card rows become [`record::CardRecord`]s, each record is
//! rendered into a card-local [`draw::Drawing`] by the
//! [`frame::CardFrameRenderer`], and the [`pager::GridPager`] tiles nine
//! cards per page with registration crosses at every grid corner. Pages go
//! to a [`pager::PageSink`]; [`pdf::PdfWriter`] turns them into a PDF,
//! embedding any font files held by a [`fonts::FontLibrary`].

pub mod assets;
pub mod card_type;
pub mod config;
pub mod draw;
pub mod error;
pub mod fonts;
pub mod frame;
pub mod geometry;
pub mod pager;
pub mod pdf;
pub mod pipeline;
pub mod record;
pub mod text;
pub mod units;

pub use card_type::{CardCategory, CardType, TypeRegistry};
pub use config::{AssetPolicy, EngineConfig};
pub use error::{AssetError, DeckError, RowError};
pub use pipeline::{DeckPipeline, RunSummary};
