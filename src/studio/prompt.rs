//! Renders a [`HeadshotConfig`] into the instruction text sent with the source photo.
//!
//! Every option maps to a fixed clause through an exhaustive `match`, so a new option
//! value does not compile until it has wording here.

use crate::studio::error::StudioError;
use crate::studio::options::{
    BackgroundType, Expression, Glasses, HeadshotConfig, PersistedConfig, Template,
};

pub const ASPECT_RATIO: &str = "1:1";

pub const NO_GLASSES_CLAUSE: &str =
    "no glasses. The subject must not wear any eyewear, frames, or sunglasses";

pub const NO_SKYLINE_CLAUSE: &str =
    "No city skyline, no cityscape, and no skyscraper windows anywhere in the background";

fn pose_clause(template: Template) -> &'static str {
    match template {
        Template::FrontSmiling => {
            "a professional front-facing corporate headshot, shoulders up, looking directly into the lens. Maintain the exact facial bone structure and jawline of the subject"
        }
        Template::HandToChin => {
            "a sophisticated contemplative pose, chest up, with the subject's actual hand resting naturally on the chin. Keep the subject's real bone structure and jaw shape; the hand must not reshape the face"
        }
        Template::SideProfile => {
            "a dynamic 45-degree angle side profile corporate portrait, head and shoulders. CRITICAL: Match the subject's unique jawline, nose bridge, and facial profile exactly as seen in the source image"
        }
    }
}

fn expression_clause(expression: Expression) -> &'static str {
    match expression {
        Expression::Smiling => {
            "an authentic corporate smile. Only the mouth and the corners of the eyes may move; do NOT widen the face, cheeks, or jaw"
        }
        Expression::Neutral => {
            "a composed professional neutral expression with relaxed mouth and steady eyes"
        }
    }
}

fn eyewear_clause(glasses: Glasses) -> &'static str {
    match glasses {
        Glasses::None => NO_GLASSES_CLAUSE,
        Glasses::Wayfarer => "wearing high-quality, realistic Classic Wayfarer glasses",
        Glasses::Round => "wearing high-quality, realistic Round Minimalist glasses",
        Glasses::Rectangular => {
            "wearing modern, sophisticated frameless rectangular glasses with thin, minimal metal arms"
        }
        Glasses::CatEye => "wearing high-quality, realistic Chic Cat-eye glasses",
        Glasses::Aviator => "wearing high-quality, realistic Professional Aviator glasses",
    }
}

fn environment_clause(background_type: BackgroundType, color: &str) -> String {
    match background_type {
        BackgroundType::Studio => format!(
            "in a professional photography studio. Textured {color} toned backdrop with a cinematic spotlight halo hitting the center directly behind the subject's head"
        ),
        BackgroundType::PlainColor => format!(
            "against a solid, professional {color} studio backdrop with subtle realistic vignetting and natural film grain"
        ),
        BackgroundType::Office => format!(
            "inside a realistic, modern corporate office interior. Soft-focus office partitions, indoor plants, and warm interior lighting. {NO_SKYLINE_CLAUSE}"
        ),
    }
}

fn clothing_clause(has_tie: bool) -> &'static str {
    if has_tie {
        "dressed in premium professional business attire. A sharp tailored suit jacket with a formal silk tie"
    } else {
        "dressed in premium professional business attire. A sharp tailored suit jacket over a modern open-neck shirt with no tie"
    }
}

fn lighting_clause(background_type: BackgroundType) -> &'static str {
    match background_type {
        BackgroundType::Studio | BackgroundType::PlainColor => {
            "soft key light at 45 degrees with gentle fill and natural catchlights in both eyes"
        }
        BackgroundType::Office => {
            "soft window-style key light blended with warm ambient interior light, natural catchlights in both eyes"
        }
    }
}

fn color_grade_clause(is_monochrome: bool) -> &'static str {
    if is_monochrome {
        "fine-art black and white with deep blacks and smooth tonal range"
    } else {
        "natural professional skin tones with true-to-life color"
    }
}

pub fn compile(config: &HeadshotConfig) -> String {
    let color = config.background_color.trim();
    let sections = [
        format!(
            "TASK: Generate a high-resolution, professional corporate {ASPECT_RATIO} square portrait of the person in the source photo."
        ),
        [
            "IDENTITY LOCK:",
            "- The subject in the output MUST be a perfect digital twin of the person in the source photo.",
            "- Maintain exact jawline width, neck circumference, and cheekbone structure.",
            "- Do NOT widen or change the face shape.",
        ]
        .join("\n"),
        [
            "RAW PHOTOGRAPHY FINISH:",
            "- NO plastic skin. Render realistic pores, fine facial hair, and authentic film grain.",
            "- Sharp focus on the eyes, natural depth of field with soft bokeh.",
        ]
        .join("\n"),
        [
            "COMPOSITION & STYLING:".to_string(),
            format!("- Pose: {}.", pose_clause(config.template)),
            format!("- Expression: {}.", expression_clause(config.expression)),
            format!("- Eyewear: {}.", eyewear_clause(config.glasses)),
            format!(
                "- Environment: {}.",
                environment_clause(config.background_type, color)
            ),
            format!("- Clothing: {}.", clothing_clause(config.has_tie)),
            format!("- Lighting: {}.", lighting_clause(config.background_type)),
            format!("- Color Grade: {}.", color_grade_clause(config.is_monochrome)),
        ]
        .join("\n"),
        format!(
            "TECHNICAL: {ASPECT_RATIO} Aspect Ratio square crop. Close-up portrait framed from mid-chest to just above the head. Tack-sharp detail, fine natural grain, no painterly smoothing."
        ),
    ];

    sections.join("\n\n")
}

/// Validates a persisted record and compiles it. Records read back from storage are
/// untrusted, so every enum field is checked here.
pub fn compile_persisted(record: &PersistedConfig) -> Result<String, StudioError> {
    let config = HeadshotConfig::try_from(record)?;
    Ok(compile(&config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::options::Choice;

    fn all_configs() -> Vec<HeadshotConfig> {
        let mut configs = Vec::new();
        for template in Template::ALL {
            for expression in Expression::ALL {
                for glasses in Glasses::ALL {
                    for background in BackgroundType::ALL {
                        for (is_monochrome, has_tie) in
                            [(false, false), (false, true), (true, false), (true, true)]
                        {
                            configs.push(
                                HeadshotConfig::default()
                                    .with_template(*template)
                                    .with_expression(*expression)
                                    .with_glasses(*glasses)
                                    .with_background(*background)
                                    .with_background_color("#2C3E50")
                                    .with_monochrome(is_monochrome)
                                    .with_tie(has_tie),
                            );
                        }
                    }
                }
            }
        }
        configs
    }

    #[test]
    fn compile_is_deterministic() {
        for config in all_configs() {
            assert_eq!(compile(&config), compile(&config.clone()));
        }
    }

    #[test]
    fn every_option_value_leaves_a_distinct_fragment() {
        let texts: Vec<String> = all_configs().iter().map(compile).collect();
        let fragments = [
            "looking directly into the lens",
            "hand resting naturally on the chin",
            "45-degree angle side profile",
            "authentic corporate smile",
            "professional neutral expression",
            NO_GLASSES_CLAUSE,
            "Classic Wayfarer glasses",
            "Round Minimalist glasses",
            "frameless rectangular glasses",
            "Chic Cat-eye glasses",
            "Professional Aviator glasses",
            "professional photography studio",
            "solid, professional #2C3E50 studio backdrop",
            "modern corporate office interior",
            "formal silk tie",
            "with no tie",
            "fine-art black and white",
            "natural professional skin tones",
        ];
        for fragment in fragments {
            assert!(
                texts.iter().any(|text| text.contains(fragment)),
                "no compiled prompt contains '{fragment}'"
            );
        }
    }

    #[test]
    fn no_glasses_is_an_explicit_negation() {
        let text = compile(&HeadshotConfig::default().with_glasses(Glasses::None));
        assert!(text.contains("Eyewear: no glasses"));
        assert!(!text.contains("wearing high-quality"));
    }

    #[test]
    fn plain_color_background_contains_the_exact_color() {
        let config = HeadshotConfig::default()
            .with_background(BackgroundType::PlainColor)
            .with_background_color("#ECF0F1");
        assert!(compile(&config).contains("#ECF0F1"));
    }

    #[test]
    fn studio_background_interpolates_the_color() {
        let config = HeadshotConfig::default().with_background_color("#7F8C8D");
        assert!(compile(&config).contains("Textured #7F8C8D toned backdrop"));
    }

    #[test]
    fn office_background_drops_color_and_forbids_skyline() {
        let config = HeadshotConfig::default()
            .with_background(BackgroundType::Office)
            .with_background_color("#F5F5DC");
        let text = compile(&config);
        assert!(!text.contains("#F5F5DC"));
        assert!(text.contains(NO_SKYLINE_CLAUSE));
    }

    #[test]
    fn smiling_never_widens_the_face() {
        let text = compile(&HeadshotConfig::default().with_expression(Expression::Smiling));
        assert!(text.contains("Only the mouth and the corners of the eyes may move"));
        assert!(text.contains("do NOT widen the face"));
    }

    #[test]
    fn every_pose_repeats_the_identity_constraint() {
        for template in Template::ALL {
            let clause = pose_clause(*template).to_lowercase();
            assert!(
                clause.contains("bone structure") || clause.contains("jawline"),
                "pose {:?} lacks an identity constraint",
                template
            );
        }
    }

    #[test]
    fn sections_appear_in_a_stable_order() {
        let text = compile(&HeadshotConfig::default());
        let headings = [
            "TASK:",
            "IDENTITY LOCK:",
            "RAW PHOTOGRAPHY FINISH:",
            "COMPOSITION & STYLING:",
            "- Pose:",
            "- Expression:",
            "- Eyewear:",
            "- Environment:",
            "- Clothing:",
            "- Lighting:",
            "- Color Grade:",
            "TECHNICAL:",
        ];
        let positions: Vec<usize> = headings
            .iter()
            .map(|heading| text.find(heading).expect(heading))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(text.contains("1:1 Aspect Ratio"));
    }

    #[test]
    fn persisted_record_with_unknown_value_fails_compilation() {
        let mut record = PersistedConfig::default();
        record.template = "Superhero Pose".to_string();
        assert_eq!(
            compile_persisted(&record),
            Err(StudioError::UnknownEnumerationValue {
                field: "template",
                value: "Superhero Pose".to_string()
            })
        );
    }

    #[test]
    fn persisted_record_compiles_like_the_typed_config() {
        let config = HeadshotConfig::default()
            .with_glasses(Glasses::Aviator)
            .with_monochrome(true);
        let record = PersistedConfig::from(&config);
        assert_eq!(compile_persisted(&record).unwrap(), compile(&config));
    }
}
