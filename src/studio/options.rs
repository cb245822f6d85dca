use serde::{Deserialize, Serialize};

use crate::studio::error::StudioError;

pub const DEFAULT_BACKGROUND_COLOR: &str = "#0F0F0F";

pub const PALETTE: [&str; 12] = [
    "#0F0F0F", "#1A1A1A", "#333333", "#4D4D4D", "#FFFDF5", "#F5F5DC", "#E8E8D0", "#D0D0B8",
    "#2C3E50", "#7F8C8D", "#BDC3C7", "#ECF0F1",
];

/// A closed set of studio options with a persisted label and a short slug.
pub trait Choice: Copy + Sized + 'static {
    const FIELD: &'static str;
    const ALL: &'static [Self];

    fn label(self) -> &'static str;
    fn slug(self) -> &'static str;

    fn parse(value: &str) -> Result<Self, StudioError> {
        let trimmed = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|choice| {
                choice.label().eq_ignore_ascii_case(trimmed)
                    || choice.slug().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| StudioError::unknown(Self::FIELD, trimmed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Template {
    #[default]
    FrontSmiling,
    HandToChin,
    SideProfile,
}

impl Choice for Template {
    const FIELD: &'static str = "template";
    const ALL: &'static [Self] = &[
        Template::FrontSmiling,
        Template::HandToChin,
        Template::SideProfile,
    ];

    fn label(self) -> &'static str {
        match self {
            Template::FrontSmiling => "Front-Facing Smiling",
            Template::HandToChin => "Hand-to-Chin Pose",
            Template::SideProfile => "CEO Side-Profile",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Template::FrontSmiling => "front-smiling",
            Template::HandToChin => "hand-to-chin",
            Template::SideProfile => "side-profile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Expression {
    Smiling,
    #[default]
    Neutral,
}

impl Choice for Expression {
    const FIELD: &'static str = "expression";
    const ALL: &'static [Self] = &[Expression::Smiling, Expression::Neutral];

    fn label(self) -> &'static str {
        match self {
            Expression::Smiling => "Smiling",
            Expression::Neutral => "Neutral",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Expression::Smiling => "smiling",
            Expression::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Glasses {
    #[default]
    None,
    Wayfarer,
    Round,
    Rectangular,
    CatEye,
    Aviator,
}

impl Choice for Glasses {
    const FIELD: &'static str = "glasses";
    const ALL: &'static [Self] = &[
        Glasses::None,
        Glasses::Wayfarer,
        Glasses::Round,
        Glasses::Rectangular,
        Glasses::CatEye,
        Glasses::Aviator,
    ];

    fn label(self) -> &'static str {
        match self {
            Glasses::None => "None",
            Glasses::Wayfarer => "Classic Wayfarer",
            Glasses::Round => "Round Minimalist",
            Glasses::Rectangular => "Modern Rectangular",
            Glasses::CatEye => "Chic Cat-eye",
            Glasses::Aviator => "Professional Aviator",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Glasses::None => "none",
            Glasses::Wayfarer => "wayfarer",
            Glasses::Round => "round",
            Glasses::Rectangular => "rectangular",
            Glasses::CatEye => "cat-eye",
            Glasses::Aviator => "aviator",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackgroundType {
    #[default]
    Studio,
    PlainColor,
    Office,
}

impl BackgroundType {
    pub fn uses_color(self) -> bool {
        match self {
            BackgroundType::Studio | BackgroundType::PlainColor => true,
            BackgroundType::Office => false,
        }
    }
}

impl Choice for BackgroundType {
    const FIELD: &'static str = "backgroundType";
    const ALL: &'static [Self] = &[
        BackgroundType::Studio,
        BackgroundType::PlainColor,
        BackgroundType::Office,
    ];

    fn label(self) -> &'static str {
        match self {
            BackgroundType::Studio => "Studio Portrait",
            BackgroundType::PlainColor => "Plain Color",
            BackgroundType::Office => "Office Setting",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            BackgroundType::Studio => "studio",
            BackgroundType::PlainColor => "plain",
            BackgroundType::Office => "office",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Portrait options. Edits build a new value; nothing mutates a config in place
/// once it has been handed to the studio.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeadshotConfig {
    pub template: Template,
    pub expression: Expression,
    pub glasses: Glasses,
    pub background_type: BackgroundType,
    pub background_color: String,
    pub is_monochrome: bool,
    pub has_tie: bool,
}

impl Default for HeadshotConfig {
    fn default() -> Self {
        Self {
            template: Template::default(),
            expression: Expression::default(),
            glasses: Glasses::default(),
            background_type: BackgroundType::default(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            is_monochrome: false,
            has_tie: true,
        }
    }
}

impl HeadshotConfig {
    pub fn with_template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    pub fn with_expression(mut self, expression: Expression) -> Self {
        self.expression = expression;
        self
    }

    pub fn with_glasses(mut self, glasses: Glasses) -> Self {
        self.glasses = glasses;
        self
    }

    pub fn with_background(mut self, background_type: BackgroundType) -> Self {
        self.background_type = background_type;
        self
    }

    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = color.into();
        self
    }

    pub fn with_monochrome(mut self, is_monochrome: bool) -> Self {
        self.is_monochrome = is_monochrome;
        self
    }

    pub fn with_tie(mut self, has_tie: bool) -> Self {
        self.has_tie = has_tie;
        self
    }
}

/// Flat on-disk form of [`HeadshotConfig`]. Enum fields stay as raw strings until
/// they pass through `TryFrom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedConfig {
    pub template: String,
    pub expression: String,
    pub glasses: String,
    pub background_type: String,
    pub background_color: String,
    pub is_monochrome: bool,
    pub has_tie: bool,
}

impl Default for PersistedConfig {
    fn default() -> Self {
        PersistedConfig::from(&HeadshotConfig::default())
    }
}

impl From<&HeadshotConfig> for PersistedConfig {
    fn from(config: &HeadshotConfig) -> Self {
        Self {
            template: config.template.label().to_string(),
            expression: config.expression.label().to_string(),
            glasses: config.glasses.label().to_string(),
            background_type: config.background_type.label().to_string(),
            background_color: config.background_color.clone(),
            is_monochrome: config.is_monochrome,
            has_tie: config.has_tie,
        }
    }
}

impl TryFrom<&PersistedConfig> for HeadshotConfig {
    type Error = StudioError;

    fn try_from(record: &PersistedConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            template: Template::parse(&record.template)?,
            expression: Expression::parse(&record.expression)?,
            glasses: Glasses::parse(&record.glasses)?,
            background_type: BackgroundType::parse(&record.background_type)?,
            background_color: record.background_color.trim().to_string(),
            is_monochrome: record.is_monochrome,
            has_tie: record.has_tie,
        })
    }
}

/// Everything the presentation layer keeps between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PersistedState {
    #[serde(default)]
    pub config: PersistedConfig,
    #[serde(default)]
    pub theme: Theme,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_fresh_session() {
        let config = HeadshotConfig::default();
        assert_eq!(config.template, Template::FrontSmiling);
        assert_eq!(config.expression, Expression::Neutral);
        assert_eq!(config.glasses, Glasses::None);
        assert_eq!(config.background_type, BackgroundType::Studio);
        assert_eq!(config.background_color, "#0F0F0F");
        assert!(!config.is_monochrome);
        assert!(config.has_tie);
        assert!(PALETTE.contains(&config.background_color.as_str()));
    }

    #[test]
    fn parse_accepts_labels_and_slugs() {
        assert_eq!(Glasses::parse("Chic Cat-eye").unwrap(), Glasses::CatEye);
        assert_eq!(Glasses::parse("cat-eye").unwrap(), Glasses::CatEye);
        assert_eq!(
            BackgroundType::parse(" plain color ").unwrap(),
            BackgroundType::PlainColor
        );
        assert_eq!(Template::parse("SIDE-PROFILE").unwrap(), Template::SideProfile);
    }

    #[test]
    fn every_choice_round_trips_through_its_label() {
        for template in Template::ALL {
            assert_eq!(Template::parse(template.label()).unwrap(), *template);
        }
        for expression in Expression::ALL {
            assert_eq!(Expression::parse(expression.label()).unwrap(), *expression);
        }
        for glasses in Glasses::ALL {
            assert_eq!(Glasses::parse(glasses.label()).unwrap(), *glasses);
        }
        for background in BackgroundType::ALL {
            assert_eq!(BackgroundType::parse(background.label()).unwrap(), *background);
        }
    }

    #[test]
    fn unknown_persisted_value_names_the_field() {
        let mut record = PersistedConfig::default();
        record.glasses = "Monocle".to_string();
        let err = HeadshotConfig::try_from(&record).unwrap_err();
        assert_eq!(
            err,
            StudioError::UnknownEnumerationValue {
                field: "glasses",
                value: "Monocle".to_string()
            }
        );
    }

    #[test]
    fn persisted_record_uses_camel_case_keys() {
        let record = PersistedConfig::from(&HeadshotConfig::default().with_tie(false));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["backgroundType"], "Studio Portrait");
        assert_eq!(value["isMonochrome"], false);
        assert_eq!(value["hasTie"], false);
    }

    #[test]
    fn missing_theme_defaults_to_light() {
        let state: PersistedState = serde_json::from_str(r##"{"config":{
            "template":"Hand-to-Chin Pose","expression":"Smiling","glasses":"None",
            "backgroundType":"Office Setting","backgroundColor":"#333333",
            "isMonochrome":true,"hasTie":false}}"##)
        .unwrap();
        assert_eq!(state.theme, Theme::Light);
        let config = HeadshotConfig::try_from(&state.config).unwrap();
        assert_eq!(config.template, Template::HandToChin);
        assert_eq!(config.background_type, BackgroundType::Office);
    }
}
