//! Category lookup tables.
//!
//! Each table is a closed enum with a total mapping to its numeric data.
//! `from_tag` is the only place raw text enters; an unrecognized tag falls
//! back to the table's default variant instead of failing.

use serde::{Deserialize, Serialize};

use crate::logging::log_lookup_fallback;

macro_rules! tagged_table {
    (
        $(#[$meta:meta])*
        $name:ident, $table:literal, default = $default:ident,
        { $($variant:ident => $tag:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn tag(&self) -> &'static str {
                match self {
                    $($name::$variant => $tag),+
                }
            }

            pub fn tags() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.tag()).collect()
            }

            /// Exact tag match, no fallback.
            pub fn parse(raw: &str) -> Option<Self> {
                let raw = raw.trim().to_lowercase();
                Self::ALL.iter().copied().find(|v| v.tag() == raw)
            }

            pub fn from_tag(raw: &str) -> Self {
                Self::parse(raw).unwrap_or_else(|| {
                    log_lookup_fallback($table, raw, $name::$default.tag());
                    $name::$default
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }
    };
}

tagged_table!(
    /// Soil texture; modifies how readily nutrients move with water.
    SoilType, "soil_type", default = Loam,
    {
        Sandy => "sandy",
        Silt => "silt",
        Loam => "loam",
        Clay => "clay",
        Peat => "peat",
    }
);

impl SoilType {
    pub fn modifier(&self) -> f64 {
        match self {
            SoilType::Sandy => 1.3,
            SoilType::Silt => 1.1,
            SoilType::Loam => 1.0,
            SoilType::Clay => 0.7,
            SoilType::Peat => 0.8,
        }
    }
}

tagged_table!(
    /// NRCS hydrologic soil group.
    HydrologicGroup, "hydrologic_group", default = B,
    {
        A => "a",
        B => "b",
        C => "c",
        D => "d",
    }
);

impl HydrologicGroup {
    /// Curve number for straight-row crops in good condition (AMC II).
    pub fn curve_number(&self) -> f64 {
        match self {
            HydrologicGroup::A => 67.0,
            HydrologicGroup::B => 78.0,
            HydrologicGroup::C => 85.0,
            HydrologicGroup::D => 89.0,
        }
    }
}

tagged_table!(
    LandCover, "land_cover", default = Rural,
    {
        Urban => "urban",
        Rural => "rural",
        Forest => "forest",
    }
);

impl LandCover {
    /// Multiplier on catchment response time; paved ground responds faster.
    pub fn response_factor(&self) -> f64 {
        match self {
            LandCover::Urban => 0.6,
            LandCover::Rural => 1.0,
            LandCover::Forest => 1.5,
        }
    }
}

tagged_table!(
    /// Construction material.
    Material, "material", default = Concrete,
    {
        Concrete => "concrete",
        Steel => "steel",
        Timber => "timber",
        Brick => "brick",
        Glass => "glass",
    }
);

impl Material {
    /// kg CO2e per kg of material. Timber is net negative (stored carbon).
    pub fn embodied_factor(&self) -> f64 {
        match self {
            Material::Concrete => 0.13,
            Material::Steel => 1.85,
            Material::Timber => -0.45,
            Material::Brick => 0.24,
            Material::Glass => 0.85,
        }
    }
}

tagged_table!(
    /// Threshold band shown next to a headline metric.
    Severity, "severity", default = Low,
    {
        Low => "low",
        Moderate => "moderate",
        High => "high",
        Critical => "critical",
    }
);

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Severity::Low => "#2e7d32",
            Severity::Moderate => "#f9a825",
            Severity::High => "#ef6c00",
            Severity::Critical => "#c62828",
        }
    }
}

tagged_table!(
    /// Carbon tracker activity.
    ActivityKind, "activity_kind", default = Car,
    {
        Car => "car",
        Bus => "bus",
        Train => "train",
        Flight => "flight",
        Electricity => "electricity",
        Gas => "gas",
        MeatMeal => "meat_meal",
        VegetarianMeal => "vegetarian_meal",
    }
);

impl ActivityKind {
    /// kg CO2 per unit.
    pub fn emission_factor(&self) -> f64 {
        match self {
            ActivityKind::Car => 0.21,
            ActivityKind::Bus => 0.089,
            ActivityKind::Train => 0.041,
            ActivityKind::Flight => 0.255,
            ActivityKind::Electricity => 0.233,
            ActivityKind::Gas => 0.184,
            ActivityKind::MeatMeal => 3.3,
            ActivityKind::VegetarianMeal => 1.7,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ActivityKind::Car | ActivityKind::Bus | ActivityKind::Train | ActivityKind::Flight => "km",
            ActivityKind::Electricity | ActivityKind::Gas => "kWh",
            ActivityKind::MeatMeal | ActivityKind::VegetarianMeal => "meal",
        }
    }
}

tagged_table!(
    /// Household water use event.
    WaterUseKind, "water_use_kind", default = Tap,
    {
        Shower => "shower",
        Toilet => "toilet",
        Dishwasher => "dishwasher",
        Laundry => "laundry",
        Garden => "garden",
        Tap => "tap",
    }
);

impl WaterUseKind {
    pub fn liters_per_unit(&self) -> f64 {
        match self {
            WaterUseKind::Shower => 9.5,
            WaterUseKind::Toilet => 6.0,
            WaterUseKind::Dishwasher => 15.0,
            WaterUseKind::Laundry => 50.0,
            WaterUseKind::Garden => 17.0,
            WaterUseKind::Tap => 6.0,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            WaterUseKind::Shower | WaterUseKind::Garden | WaterUseKind::Tap => "min",
            WaterUseKind::Toilet => "flush",
            WaterUseKind::Dishwasher | WaterUseKind::Laundry => "load",
        }
    }
}

tagged_table!(
    WasteStream, "waste_stream", default = Landfill,
    {
        Landfill => "landfill",
        Recycling => "recycling",
        Compost => "compost",
        Hazardous => "hazardous",
    }
);

impl WasteStream {
    /// Counts toward the diversion rate.
    pub fn is_diverted(&self) -> bool {
        matches!(self, WasteStream::Recycling | WasteStream::Compost)
    }
}

tagged_table!(
    PurchaseCategory, "purchase_category", default = Other,
    {
        Clothing => "clothing",
        Electronics => "electronics",
        Furniture => "furniture",
        Other => "other",
    }
);

impl PurchaseCategory {
    /// Expected service life in months, used to flag early replacements.
    pub fn expected_life_months(&self) -> u32 {
        match self {
            PurchaseCategory::Clothing => 36,
            PurchaseCategory::Electronics => 48,
            PurchaseCategory::Furniture => 120,
            PurchaseCategory::Other => 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_declared_tag_round_trips() {
        for soil in SoilType::ALL {
            assert_eq!(SoilType::from_tag(soil.tag()), *soil);
            assert!(soil.modifier() > 0.0);
        }
        for group in HydrologicGroup::ALL {
            assert_eq!(HydrologicGroup::from_tag(group.tag()), *group);
            assert!(group.curve_number() > 0.0 && group.curve_number() < 100.0);
        }
        for cover in LandCover::ALL {
            assert_eq!(LandCover::from_tag(cover.tag()), *cover);
        }
        for material in Material::ALL {
            assert_eq!(Material::from_tag(material.tag()), *material);
        }
        for kind in ActivityKind::ALL {
            assert_eq!(ActivityKind::parse(kind.tag()), Some(*kind));
            assert!(kind.emission_factor() > 0.0);
        }
        for kind in WaterUseKind::ALL {
            assert_eq!(WaterUseKind::parse(kind.tag()), Some(*kind));
        }
        for severity in Severity::ALL {
            assert_eq!(Severity::from_tag(severity.tag()), *severity);
            assert!(severity.color().starts_with('#'));
        }
    }

    #[test]
    fn test_unknown_tag_falls_back_to_default() {
        assert_eq!(SoilType::from_tag("volcanic"), SoilType::Loam);
        assert_eq!(HydrologicGroup::from_tag(""), HydrologicGroup::B);
        assert_eq!(LandCover::from_tag("desert"), LandCover::Rural);
        assert_eq!(Material::from_tag("unobtainium"), Material::Concrete);
    }

    #[test]
    fn test_parse_has_no_fallback() {
        assert_eq!(ActivityKind::parse("hoverboard"), None);
        assert_eq!(WasteStream::parse("Compost"), Some(WasteStream::Compost));
    }

    #[test]
    fn test_tags_are_case_insensitive() {
        assert_eq!(SoilType::from_tag("SANDY"), SoilType::Sandy);
        assert_eq!(HydrologicGroup::parse("C"), Some(HydrologicGroup::C));
    }

    #[test]
    fn test_severity_ordering_follows_declaration() {
        let labels: Vec<_> = Severity::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["Low", "Moderate", "High", "Critical"]);
    }
}
