//! Town map loading.
//!
//! Sessions are declared on the town map itself: every object whose type
//! (or, in newer Tiled files, class) is `KnuckleGameArea` becomes one
//! session, named after the object.

use std::path::Path;

use knuckle_game::{Session, Zone, ZoneDescriptor};
use knuckle_sync::SyncConfig;
use serde::Deserialize;

use crate::KnuckleError;

/// Map object type that marks a Knucklebones zone.
pub const GAME_AREA_TYPE: &str = "KnuckleGameArea";

/// A Tiled-style town map plus the settings for the sessions it declares.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TownConfig {
    #[serde(default)]
    pub layers: Vec<MapLayer>,

    /// Not part of the map file. Set with [`TownConfig::with_sync`].
    #[serde(skip)]
    pub sync: SyncConfig,
}

/// One map layer. Only object layers and groups are inspected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapLayer {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub objects: Vec<MapObject>,

    /// Child layers of a `group` layer.
    #[serde(default)]
    pub layers: Vec<MapLayer>,
}

/// One object on an object layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapObject {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub class: String,

    #[serde(default)]
    pub x: f64,

    #[serde(default)]
    pub y: f64,

    #[serde(default)]
    pub width: Option<f64>,

    #[serde(default)]
    pub height: Option<f64>,
}

impl MapObject {
    pub fn is_game_area(&self) -> bool {
        self.kind == GAME_AREA_TYPE || self.class == GAME_AREA_TYPE
    }

    fn descriptor(&self) -> ZoneDescriptor {
        ZoneDescriptor {
            name: self.name.clone(),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

impl TownConfig {
    /// Parses a town map from JSON.
    ///
    /// # Errors
    /// [`KnuckleError::Map`] if the document is not a map.
    pub fn from_json(json: &str) -> Result<Self, KnuckleError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a town map file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, KnuckleError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    /// Every game area on the map, in layer order, unvalidated.
    pub fn zones(&self) -> Vec<ZoneDescriptor> {
        let mut zones = Vec::new();
        collect_zones(&self.layers, &mut zones);
        zones
    }

    /// Builds one idle session per game area.
    ///
    /// # Errors
    /// [`KnuckleError::Zone`] on the first malformed area.
    pub fn sessions(&self) -> Result<Vec<Session>, KnuckleError> {
        self.zones()
            .iter()
            .map(|descriptor| -> Result<Session, KnuckleError> {
                Ok(Session::new(Zone::from_descriptor(descriptor)?))
            })
            .collect()
    }
}

fn collect_zones(layers: &[MapLayer], out: &mut Vec<ZoneDescriptor>) {
    for layer in layers {
        match layer.kind.as_str() {
            "objectgroup" => out.extend(
                layer
                    .objects
                    .iter()
                    .filter(|object| object.is_game_area())
                    .map(MapObject::descriptor),
            ),
            "group" => collect_zones(&layer.layers, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"{
        "width": 40,
        "height": 30,
        "layers": [
            { "type": "tilelayer", "name": "Ground", "data": [1, 2, 3] },
            {
                "type": "objectgroup",
                "name": "Objects",
                "objects": [
                    { "type": "ConversationArea", "name": "Chat", "x": 0, "y": 0, "width": 10, "height": 10 },
                    { "type": "KnuckleGameArea", "name": "Knuckles1", "x": 96, "y": 160, "width": 96, "height": 64 }
                ]
            },
            {
                "type": "group",
                "name": "Upstairs",
                "layers": [
                    {
                        "type": "objectgroup",
                        "name": "Games",
                        "objects": [
                            { "class": "KnuckleGameArea", "name": "Knuckles2", "x": 300, "y": 40, "width": 64, "height": 64 }
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_zones_found_in_object_layers_and_groups() {
        let config = TownConfig::from_json(MAP).unwrap();
        let names: Vec<String> = config.zones().into_iter().map(|z| z.name).collect();
        assert_eq!(names, vec!["Knuckles1", "Knuckles2"]);
    }

    #[test]
    fn test_sessions_start_idle_and_empty() {
        let sessions = TownConfig::from_json(MAP).unwrap().sessions().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id().as_str(), "Knuckles1");
        assert!(!sessions[0].zone().is_active());
        assert_eq!(sessions[0].zone().bounds().width, 96.0);
    }

    #[test]
    fn test_point_object_is_malformed() {
        let map = r#"{ "layers": [ { "type": "objectgroup", "objects": [
            { "type": "KnuckleGameArea", "name": "Dot", "x": 5, "y": 5, "point": true }
        ] } ] }"#;
        let err = TownConfig::from_json(map).unwrap().sessions().unwrap_err();
        assert!(matches!(err, KnuckleError::Zone(_)));
    }

    #[test]
    fn test_not_a_map_is_rejected() {
        assert!(matches!(
            TownConfig::from_json(r#"{ "layers": 3 }"#),
            Err(KnuckleError::Map(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            TownConfig::from_path("/definitely/not/here.json"),
            Err(KnuckleError::Io(_))
        ));
    }

    #[test]
    fn test_with_sync_overrides_defaults() {
        let sync = SyncConfig {
            channel_size: 4,
            ..SyncConfig::default()
        };
        let config = TownConfig::default().with_sync(sync.clone());
        assert_eq!(config.sync, sync);
        assert!(config.zones().is_empty());
    }
}
