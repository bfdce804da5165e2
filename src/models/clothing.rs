use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClothingType {
    Headwear,
    Top,
    Outerwear,
    Bottom,
    Footwear,
}

impl ClothingType {
    pub const ALL: [ClothingType; 5] = [
        ClothingType::Headwear,
        ClothingType::Top,
        ClothingType::Outerwear,
        ClothingType::Bottom,
        ClothingType::Footwear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClothingType::Headwear => "HEADWEAR",
            ClothingType::Top => "TOP",
            ClothingType::Outerwear => "OUTERWEAR",
            ClothingType::Bottom => "BOTTOM",
            ClothingType::Footwear => "FOOTWEAR",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Temperature {
    Hot,
    Warm,
    Mild,
    Cold,
    Freezing,
}

impl Temperature {
    pub const ALL: [Temperature; 5] = [
        Temperature::Hot,
        Temperature::Warm,
        Temperature::Mild,
        Temperature::Cold,
        Temperature::Freezing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Temperature::Hot => "HOT",
            Temperature::Warm => "WARM",
            Temperature::Mild => "MILD",
            Temperature::Cold => "COLD",
            Temperature::Freezing => "FREEZING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for ClothingType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        ClothingType::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| UnknownVariant {
                kind: "clothing type",
                value: s.to_string(),
            })
    }
}

impl FromStr for Temperature {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Temperature::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| UnknownVariant {
                kind: "temperature",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for ClothingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured output expected from the vision classifier.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClothingClassification {
    #[serde(rename = "type")]
    pub clothing_type: ClothingType,
    pub primary_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_colors: Option<Vec<String>>,
    pub material: String,
    pub temperature: Temperature,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Clothing {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub image_path: String,
    #[serde(rename = "type")]
    pub clothing_type: ClothingType,
    pub primary_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(default)]
    pub other_colors: Vec<String>,
    pub material: String,
    pub temperature: Temperature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Clothing {
    pub fn from_classification(
        id: Uuid,
        image_path: String,
        classification: ClothingClassification,
    ) -> Self {
        let description = Some(classification.description).filter(|d| !d.trim().is_empty());
        Clothing {
            id,
            image_path,
            clothing_type: classification.clothing_type,
            primary_color: classification.primary_color,
            secondary_color: classification.secondary_color.filter(|c| !c.trim().is_empty()),
            other_colors: classification.other_colors.unwrap_or_default(),
            material: classification.material,
            temperature: classification.temperature,
            description,
            created_at: Utc::now(),
        }
    }

    /// Single line describing this item for the outfit stylist.
    pub fn inventory_line(&self) -> String {
        let mut colors = self.primary_color.clone();
        if let Some(secondary) = &self.secondary_color {
            colors.push_str(" and ");
            colors.push_str(secondary);
        }
        format!(
            "id: {}, type: {}, color: {}, material: {}, temperature: {}, description: {}",
            self.id,
            self.clothing_type,
            colors,
            self.material,
            self.temperature,
            self.description.as_deref().unwrap_or("none"),
        )
    }

    fn has_color(&self, color: &str) -> bool {
        self.primary_color.eq_ignore_ascii_case(color)
            || self
                .secondary_color
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(color))
            || self.other_colors.iter().any(|c| c.eq_ignore_ascii_case(color))
    }
}

/// Optional narrowing applied when listing a closet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClothingFilter {
    pub clothing_type: Option<ClothingType>,
    pub color: Option<String>,
    pub material: Option<String>,
}

impl ClothingFilter {
    pub fn matches(&self, item: &Clothing) -> bool {
        if let Some(t) = self.clothing_type {
            if item.clothing_type != t {
                return false;
            }
        }
        if let Some(color) = &self.color {
            if !item.has_color(color) {
                return false;
            }
        }
        if let Some(material) = &self.material {
            if !item.material.eq_ignore_ascii_case(material) {
                return false;
            }
        }
        true
    }
}
