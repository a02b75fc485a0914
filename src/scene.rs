//! Artboard data model and coordinate normalization
//!
//! An artboard's `state` is a scene-graph document: an ordered list of
//! drawable objects plus passthrough fields (version, background, ...).
//! Exactly one object in the list is the artboard's *self-reference* — the
//! object whose `data.id` matches the artboard's own id. Its `left`/`top`
//! define the artboard's placement inside its own coordinate space and its
//! `width`/`height` the canvas size to render at.
//!
//! Normalization translates every object so the self-reference lands at the
//! origin. The input is never mutated; only `left`/`top` change on the way
//! through, everything else is carried verbatim via flattened maps.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named rectangular export region carrying a serialized scene graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artboard {
    /// Opaque identifier; must match exactly one object's `data.id` in `state`
    pub id: String,
    /// Base name of the output file (`<name>.png`); not sanitized here
    pub name: String,
    /// Declared artboard width
    pub width: f64,
    /// Declared artboard height
    pub height: f64,
    /// Scene-graph document produced by the design editor
    #[serde(default)]
    pub state: Option<SceneDocument>,
}

/// A scene-graph document: drawable objects plus passthrough fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    /// Every non-`objects` field of the document, carried through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One drawable object. Only the placement fields and the identifying tag
/// are typed; the rest of the object (fill, angle, paths, ...) rides along
/// in `extra` and is re-serialized unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneObject {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub data: ObjectData,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Application tag attached to each object; `id` is used for self-lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A scene translated so the artboard's self-reference sits at (0,0),
/// paired with the canvas size to render at. Built per export call and
/// discarded after rasterization.
#[derive(Debug, Clone)]
pub struct NormalizedScene {
    pub document: SceneDocument,
    pub width: f64,
    pub height: f64,
}

/// Locate the self-reference object by identity match on `data.id`.
pub fn find_self<'a>(objects: &'a [SceneObject], id: &str) -> Option<&'a SceneObject> {
    objects.iter().find(|obj| obj.data.id.as_deref() == Some(id))
}

/// Translate the artboard's scene graph so its self-reference sits at the
/// origin.
///
/// Fails with [`Error::MissingSelfReference`] when no object matches the
/// artboard's id, and with [`Error::UndefinedAdjustment`] when the
/// self-reference's `left`, `top`, `width`, or `height` is zero. Absent
/// fields deserialize to zero, so a legitimate zero offset is rejected the
/// same way a missing one is — this mirrors the upstream editor's contract,
/// where artboards never sit exactly at the workspace origin.
pub fn normalize(artboard: &Artboard) -> Result<NormalizedScene> {
    let state = artboard.state.as_ref().ok_or(Error::MissingSelfReference {
        id: artboard.id.clone(),
    })?;

    let own = find_self(&state.objects, &artboard.id).ok_or(Error::MissingSelfReference {
        id: artboard.id.clone(),
    })?;

    let checks: [(&'static str, f64); 4] = [
        ("left", own.left),
        ("top", own.top),
        ("width", own.width),
        ("height", own.height),
    ];
    for (field, value) in checks {
        if value == 0.0 {
            return Err(Error::UndefinedAdjustment {
                id: artboard.id.clone(),
                field,
            });
        }
    }

    let (offset_left, offset_top) = (own.left, own.top);
    let (width, height) = (own.width, own.height);

    let objects = state
        .objects
        .iter()
        .map(|obj| SceneObject {
            left: obj.left - offset_left,
            top: obj.top - offset_top,
            ..obj.clone()
        })
        .collect();

    Ok(NormalizedScene {
        document: SceneDocument {
            objects,
            extra: state.extra.clone(),
        },
        width,
        height,
    })
}
