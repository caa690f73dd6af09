use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("scene {scene} is missing required field '{field}'")]
    MissingField { scene: usize, field: &'static str },
    #[error("scene {scene} has an empty '{field}'")]
    EmptyField { scene: usize, field: &'static str },
    #[error("script has no scenes")]
    Empty,
    #[error("failed to parse script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read script: {0}")]
    Read(#[from] std::io::Error),
}

/// One narrated beat of the video.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub scene_description: String,
    pub voiceover_text: String,
}

/// Ordered scenes to render.
#[derive(Clone, Debug, PartialEq)]
pub struct Script {
    scenes: Vec<Scene>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScene {
    scene_description: Option<String>,
    voiceover_text: Option<String>,
}

#[derive(Deserialize)]
struct WrappedScript {
    scenes: Vec<RawScene>,
}

const SCENE_DESCRIPTION: &str = "sceneDescription";
const VOICEOVER_TEXT: &str = "voiceoverText";

impl Script {
    /// Builds a validated script. Scene numbers in errors are 1-based.
    pub fn new(scenes: Vec<Scene>) -> Result<Self, ScriptError> {
        let script = Self { scenes };
        script.validate()?;
        Ok(script)
    }

    /// Parses either a bare JSON array of scenes or an object with a
    /// `scenes` array. Each scene needs `sceneDescription` and
    /// `voiceoverText`.
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let raw = if json.trim_start().starts_with('{') {
            serde_json::from_str::<WrappedScript>(json)?.scenes
        } else {
            serde_json::from_str::<Vec<RawScene>>(json)?
        };

        let scenes = raw
            .into_iter()
            .enumerate()
            .map(|(i, scene)| {
                let number = i + 1;
                Ok(Scene {
                    scene_description: scene.scene_description.ok_or(
                        ScriptError::MissingField {
                            scene: number,
                            field: SCENE_DESCRIPTION,
                        },
                    )?,
                    voiceover_text: scene.voiceover_text.ok_or(ScriptError::MissingField {
                        scene: number,
                        field: VOICEOVER_TEXT,
                    })?,
                })
            })
            .collect::<Result<Vec<_>, ScriptError>>()?;

        Self::new(scenes)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.scenes.is_empty() {
            return Err(ScriptError::Empty);
        }
        for (i, scene) in self.scenes.iter().enumerate() {
            if scene.scene_description.trim().is_empty() {
                return Err(ScriptError::EmptyField {
                    scene: i + 1,
                    field: SCENE_DESCRIPTION,
                });
            }
            if scene.voiceover_text.trim().is_empty() {
                return Err(ScriptError::EmptyField {
                    scene: i + 1,
                    field: VOICEOVER_TEXT,
                });
            }
        }
        Ok(())
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_scene_array() {
        let json = r#"[
            {"sceneDescription": "A robot in a factory", "voiceoverText": "Day 1."},
            {"sceneDescription": "Sunset", "voiceoverText": "He was built to serve."}
        ]"#;
        let script = Script::from_json(json).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.scenes()[1].voiceover_text, "He was built to serve.");
    }

    #[test]
    fn test_parses_wrapped_scenes() {
        let json = r#"{"scenes": [{"sceneDescription": "a", "voiceoverText": "b"}]}"#;
        assert_eq!(Script::from_json(json).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_field_names_scene_and_field() {
        let json = r#"[
            {"sceneDescription": "ok", "voiceoverText": "ok"},
            {"sceneDescription": "no voice"}
        ]"#;
        let err = Script::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::MissingField {
                scene: 2,
                field: "voiceoverText"
            }
        ));
        assert_eq!(
            err.to_string(),
            "scene 2 is missing required field 'voiceoverText'"
        );
    }

    #[test]
    fn test_whitespace_only_field_is_empty() {
        let json = r#"[{"sceneDescription": "   ", "voiceoverText": "text"}]"#;
        let err = Script::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::EmptyField {
                scene: 1,
                field: "sceneDescription"
            }
        ));
    }

    #[test]
    fn test_empty_script_rejected() {
        assert!(matches!(Script::from_json("[]"), Err(ScriptError::Empty)));
        assert!(matches!(Script::new(vec![]), Err(ScriptError::Empty)));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            Script::from_json("[{"),
            Err(ScriptError::Parse(_))
        ));
    }

    #[test]
    fn test_malformed_wrapped_script_reports_field_error() {
        let json = r#"{"scenes": [{"sceneDescription": 5, "voiceoverText": "Day 1."}]}"#;
        let err = Script::from_json(json).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ScriptError::Parse(_)));
        assert!(message.contains("invalid type: integer"), "{message}");
        assert!(!message.contains("sequence"), "{message}");
    }

    #[test]
    fn test_object_without_scenes_names_the_key() {
        let err = Script::from_json(r#"{"shots": []}"#).unwrap_err();
        assert!(err.to_string().contains("missing field `scenes`"), "{err}");
    }

    #[test]
    fn test_from_file_missing_is_read_error() {
        let err = Script::from_file(Path::new("/nonexistent/script.json")).unwrap_err();
        assert!(matches!(err, ScriptError::Read(_)));
    }
}
