// Card categories and the registry of their display styles

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::assets::{AssetSource, RasterAsset};
use crate::config::EngineConfig;
use crate::draw::Rgb;
use crate::error::DeckError;

// ============================================================================
// Categories
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardCategory {
    Event,
    Thing,
    Aspect,
    Character,
    Place,
    Ending,
}

impl CardCategory {
    pub const ALL: [CardCategory; 6] = [
        CardCategory::Event,
        CardCategory::Thing,
        CardCategory::Aspect,
        CardCategory::Character,
        CardCategory::Place,
        CardCategory::Ending,
    ];

    /// The key used in the input data
    pub fn key(self) -> &'static str {
        match self {
            CardCategory::Event => "Event",
            CardCategory::Thing => "Thing",
            CardCategory::Aspect => "Aspect",
            CardCategory::Character => "Character",
            CardCategory::Place => "Place",
            CardCategory::Ending => "Ending",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CardCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CardCategory::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Configured look of a category: display name, hex color, optional icon asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeStyle {
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl TypeStyle {
    pub fn default_for(category: CardCategory) -> TypeStyle {
        let (name, color) = match category {
            CardCategory::Event => ("Evento", "FF4040"),
            CardCategory::Thing => ("Aĵo", "4040FF"),
            CardCategory::Aspect => ("Trajto", "40FF40"),
            CardCategory::Character => ("Rolulo", "FFFF40"),
            CardCategory::Place => ("Loko", "40FFFF"),
            CardCategory::Ending => ("Fino", "FF40FF"),
        };
        TypeStyle {
            name: name.to_string(),
            color: color.to_string(),
            icon: None,
        }
    }
}

// ============================================================================
// Card Types
// ============================================================================

/// Resolved, immutable style shared by every card of a category.
#[derive(Debug, Clone, PartialEq)]
pub struct CardType {
    pub category: CardCategory,
    pub display_name: String,
    pub color: Rgb,
    pub icon: Option<Rc<RasterAsset>>,
}

impl CardType {
    /// The ending category gets its own typography and full-card centering.
    pub fn is_ending(&self) -> bool {
        self.category == CardCategory::Ending
    }
}

/// Category key to card type table, built once at startup.
#[derive(Debug)]
pub struct TypeRegistry {
    types: Vec<CardType>,
}

impl TypeRegistry {
    /// Decode every palette color and load configured icons.
    pub fn new(config: &EngineConfig, assets: &dyn AssetSource) -> Result<Self, DeckError> {
        let mut types = Vec::with_capacity(CardCategory::ALL.len());
        for category in CardCategory::ALL {
            let style = config.style_for(category);
            let color = Rgb::from_hex(&style.color).map_err(|source| DeckError::Color {
                context: format!("palette color for {}", category),
                source,
            })?;
            let icon = match (&style.icon, config.features.icons) {
                (Some(reference), true) => {
                    Some(assets.load(reference).map_err(|source| DeckError::StartupAsset {
                        context: format!("icon for {}", category),
                        source,
                    })?)
                }
                _ => None,
            };
            types.push(CardType {
                category,
                display_name: style.name,
                color,
                icon,
            });
        }
        Ok(Self { types })
    }

    pub fn get(&self, category: CardCategory) -> &CardType {
        &self.types[category.index()]
    }

    /// Look up a category key from input data.
    pub fn resolve(&self, key: &str) -> Option<&CardType> {
        key.parse::<CardCategory>().ok().map(|c| self.get(c))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CardType> {
        self.types.iter()
    }
}
