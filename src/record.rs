// Card records parsed from tab-separated rows

use crate::card_type::{CardType, TypeRegistry};
use crate::error::RowError;

/// Column indices in the tab-separated input
const CATEGORY_COLUMN: usize = 3;
const INTERRUPT_COLUMN: usize = 4;
const TEXT_COLUMN: usize = 5;
const IMAGE_COLUMN: usize = 6;
const MIN_COLUMNS: usize = TEXT_COLUMN + 1;

/// The literal that marks an interrupt card
pub const INTERRUPT_MARKER: &str = "Y";

/// One validated card, borrowing its type from the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct CardRecord<'r> {
    /// 1-based line number in the input
    pub line: usize,
    pub body_text: String,
    pub card_type: &'r CardType,
    pub interrupt: bool,
    pub image: Option<String>,
}

/// Parse one data row.
///
/// Trailing whitespace (including trailing tabs) is stripped before the row
/// is split, so `a\tb\tc\tEvent\t\tHello\t` has six columns.
pub fn parse_row<'r>(
    row: &str,
    line: usize,
    registry: &'r TypeRegistry,
) -> Result<CardRecord<'r>, RowError> {
    let parts: Vec<&str> = row.trim_end().split('\t').collect();

    if parts.len() < MIN_COLUMNS {
        return Err(RowError::Structural {
            line,
            columns: parts.len(),
        });
    }

    let body_text = parts[TEXT_COLUMN].trim();
    if body_text.is_empty() {
        return Err(RowError::EmptyText { line });
    }

    let key = parts[CATEGORY_COLUMN].trim();
    let card_type = registry
        .resolve(key)
        .ok_or_else(|| RowError::UnknownCategory {
            line,
            key: key.to_string(),
        })?;

    let interrupt = match parts[INTERRUPT_COLUMN].trim() {
        "" => false,
        INTERRUPT_MARKER => true,
        other => {
            return Err(RowError::MalformedFlag {
                line,
                value: other.to_string(),
            })
        }
    };

    let image = parts
        .get(IMAGE_COLUMN)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(CardRecord {
        line,
        body_text: body_text.to_string(),
        card_type,
        interrupt,
        image,
    })
}
