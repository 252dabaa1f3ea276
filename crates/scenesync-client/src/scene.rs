// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    api::LabelID,
    media::{Dimensions, MediaIdentifier},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point in pixel coordinates.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Geometry of an annotation.
///
/// Rectangles and ellipses are described by their bounding box with `x`/`y`
/// at the top-left corner. Rotated rectangles use `x`/`y` for the centre and
/// `angle` in degrees.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Shape {
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Ellipse {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Polygon {
        points: Vec<Point>,
    },
    RotatedRectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        angle: f64,
    },
}

impl Shape {
    /// A rectangle covering the full media item.
    pub fn full_image(dimensions: Dimensions) -> Self {
        Shape::Rectangle {
            x: 0.0,
            y: 0.0,
            width: dimensions.width as f64,
            height: dimensions.height as f64,
        }
    }

    /// Scales the shape by `sx` horizontally and `sy` vertically. Angles are
    /// left untouched.
    fn scaled(&self, sx: f64, sy: f64) -> Self {
        match self {
            Shape::Rectangle {
                x,
                y,
                width,
                height,
            } => Shape::Rectangle {
                x: x * sx,
                y: y * sy,
                width: width * sx,
                height: height * sy,
            },
            Shape::Ellipse {
                x,
                y,
                width,
                height,
            } => Shape::Ellipse {
                x: x * sx,
                y: y * sy,
                width: width * sx,
                height: height * sy,
            },
            Shape::Polygon { points } => Shape::Polygon {
                points: points
                    .iter()
                    .map(|p| Point::new(p.x * sx, p.y * sy))
                    .collect(),
            },
            Shape::RotatedRectangle {
                x,
                y,
                width,
                height,
                angle,
            } => Shape::RotatedRectangle {
                x: x * sx,
                y: y * sy,
                width: width * sx,
                height: height * sy,
                angle: *angle,
            },
        }
    }

    /// Converts pixel coordinates into coordinates relative to the image
    /// size, in the range [0, 1].
    pub fn normalized(&self, dimensions: Dimensions) -> Self {
        self.scaled(
            1.0 / dimensions.width as f64,
            1.0 / dimensions.height as f64,
        )
    }

    /// Converts relative coordinates back into pixel coordinates.
    pub fn denormalized(&self, dimensions: Dimensions) -> Self {
        self.scaled(dimensions.width as f64, dimensions.height as f64)
    }

    /// Returns the shape with non-negative extents. Boxes drawn from the
    /// bottom-right corner arrive with negative width or height.
    pub fn canonical(&self) -> Self {
        fn flip(origin: f64, extent: f64) -> (f64, f64) {
            if extent < 0.0 {
                (origin + extent, -extent)
            } else {
                (origin, extent)
            }
        }

        match self {
            Shape::Rectangle {
                x,
                y,
                width,
                height,
            } => {
                let (x, width) = flip(*x, *width);
                let (y, height) = flip(*y, *height);
                Shape::Rectangle {
                    x,
                    y,
                    width,
                    height,
                }
            }
            Shape::Ellipse {
                x,
                y,
                width,
                height,
            } => {
                let (x, width) = flip(*x, *width);
                let (y, height) = flip(*y, *height);
                Shape::Ellipse {
                    x,
                    y,
                    width,
                    height,
                }
            }
            Shape::RotatedRectangle {
                x,
                y,
                width,
                height,
                angle,
            } => Shape::RotatedRectangle {
                x: *x,
                y: *y,
                width: width.abs(),
                height: height.abs(),
                angle: *angle,
            },
            Shape::Polygon { points } => Shape::Polygon {
                points: points.clone(),
            },
        }
    }
}

fn default_probability() -> f64 {
    1.0
}

/// A label attached to an annotation, with the confidence it was assigned.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScoredLabel {
    pub id: LabelID,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_probability")]
    pub probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<serde_json::Value>,
}

impl ScoredLabel {
    pub fn new(id: LabelID, name: &str) -> Self {
        ScoredLabel {
            id,
            name: Some(name.to_string()),
            probability: 1.0,
            color: None,
            source: None,
        }
    }
}

/// A shape with one or more labels.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Annotation {
    pub labels: Vec<ScoredLabel>,
    pub shape: Shape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

impl Annotation {
    pub fn new(shape: Shape, labels: Vec<ScoredLabel>) -> Self {
        Annotation {
            labels,
            shape,
            id: None,
            modified: None,
        }
    }

    pub fn label_names(&self) -> Vec<&str> {
        self.labels
            .iter()
            .filter_map(|label| label.name.as_deref())
            .collect()
    }
}

/// Origin of an annotation scene.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Created by a user.
    #[default]
    Annotation,
    /// Produced by a model.
    Prediction,
    /// Placeholder for media without any annotation.
    Empty,
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            AnnotationKind::Annotation => "annotation",
            AnnotationKind::Prediction => "prediction",
            AnnotationKind::Empty => "empty",
        };
        write!(f, "{}", value)
    }
}

/// All annotations attached to one media item at one point in time.
///
/// A scene is built from an annotation reader or parsed from a platform
/// response, optionally extended with more annotations, and uploaded. Scenes
/// without annotations are never sent to the platform.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct AnnotationScene {
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_identifier: Option<MediaIdentifier>,
    #[serde(default)]
    pub kind: AnnotationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotation_state_per_task: Vec<serde_json::Value>,
}

impl AnnotationScene {
    pub fn new(
        media_identifier: MediaIdentifier,
        annotations: Vec<Annotation>,
        kind: AnnotationKind,
    ) -> Self {
        AnnotationScene {
            annotations,
            media_identifier: Some(media_identifier),
            kind,
            ..Default::default()
        }
    }

    pub fn has_data(&self) -> bool {
        !self.annotations.is_empty()
    }

    /// Returns the scene bound to another media item.
    pub fn apply_identifier(mut self, media_identifier: MediaIdentifier) -> Self {
        self.media_identifier = Some(media_identifier);
        self
    }

    /// Appends annotations after the existing ones.
    pub fn extend(&mut self, annotations: impl IntoIterator<Item = Annotation>) {
        self.annotations.extend(annotations);
    }

    /// Clears server-managed fields and canonicalizes shapes before the scene
    /// is posted.
    pub fn prepare_for_post(&mut self) {
        self.modified = None;
        for annotation in &mut self.annotations {
            annotation.modified = None;
            annotation.shape = annotation.shape.canonical();
            for label in &mut annotation.labels {
                label.source = None;
            }
        }
    }

    /// Removes every platform identifier from the scene, leaving only the
    /// labels and geometry. Label ids are kept so labels can be mapped back.
    pub fn deidentify(&mut self) {
        self.id = None;
        self.modified = None;
        self.media_identifier = None;
        for annotation in &mut self.annotations {
            annotation.id = None;
            annotation.modified = None;
        }
    }

    /// Distinct label names used in the scene, in order of appearance.
    pub fn label_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for annotation in &self.annotations {
            for name in annotation.label_names() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn label(id: &str, name: &str) -> ScoredLabel {
        ScoredLabel::new(id.try_into().unwrap(), name)
    }

    #[test]
    fn test_shape_serialization() {
        let shape = Shape::RotatedRectangle {
            x: 10.0,
            y: 20.0,
            width: 4.0,
            height: 2.0,
            angle: 45.0,
        };
        assert_eq!(
            serde_json::to_value(&shape).unwrap(),
            json!({
                "type": "ROTATED_RECTANGLE",
                "x": 10.0, "y": 20.0, "width": 4.0, "height": 2.0, "angle": 45.0
            })
        );

        let polygon: Shape = serde_json::from_value(json!({
            "type": "POLYGON",
            "points": [{"x": 1, "y": 2}, {"x": 3, "y": 4}, {"x": 5, "y": 0}]
        }))
        .unwrap();
        assert!(matches!(polygon, Shape::Polygon { ref points } if points.len() == 3));
    }

    #[test]
    fn test_canonical_flips_negative_extents() {
        let shape = Shape::Rectangle {
            x: 50.0,
            y: 40.0,
            width: -20.0,
            height: -10.0,
        };
        assert_eq!(
            shape.canonical(),
            Shape::Rectangle {
                x: 30.0,
                y: 30.0,
                width: 20.0,
                height: 10.0
            }
        );
    }

    #[test]
    fn test_normalize_denormalize() {
        let dims = Dimensions::new(256, 128);
        let shape = Shape::Ellipse {
            x: 64.0,
            y: 32.0,
            width: 128.0,
            height: 64.0,
        };
        let normalized = shape.normalized(dims);
        assert_eq!(
            normalized,
            Shape::Ellipse {
                x: 0.25,
                y: 0.25,
                width: 0.5,
                height: 0.5
            }
        );
        assert_eq!(normalized.denormalized(dims), shape);
    }

    #[test]
    fn test_extend_keeps_order() {
        let identifier = MediaIdentifier::Image {
            image_id: "i1".try_into().unwrap(),
        };
        let a1 = Annotation::new(
            Shape::full_image(Dimensions::new(10, 10)),
            vec![label("l1", "cat")],
        );
        let a2 = Annotation::new(
            Shape::full_image(Dimensions::new(10, 10)),
            vec![label("l2", "dog")],
        );

        let mut scene = AnnotationScene::new(identifier, vec![], AnnotationKind::Annotation);
        assert!(!scene.has_data());
        scene.extend(vec![a1.clone()]);
        scene.extend(vec![a2.clone()]);
        assert_eq!(scene.annotations, vec![a1, a2]);
        assert_eq!(scene.label_names(), vec!["cat", "dog"]);
    }

    #[test]
    fn test_scene_from_platform_response() {
        let scene: AnnotationScene = serde_json::from_value(json!({
            "id": "s1",
            "kind": "prediction",
            "modified": "2023-04-01T10:00:00.000000+00:00",
            "media_identifier": {"type": "image", "image_id": "i1"},
            "annotation_state_per_task": [{"task_id": "t1", "state": "annotated"}],
            "annotations": [{
                "id": "a1",
                "modified": "2023-04-01T10:00:00.000000+00:00",
                "labels": [{"id": "l1", "name": "cat", "probability": 0.9,
                            "source": {"user_id": "u1"}}],
                "shape": {"type": "RECTANGLE", "x": 1, "y": 2, "width": 3, "height": 4}
            }]
        }))
        .unwrap();

        assert_eq!(scene.kind, AnnotationKind::Prediction);
        assert!(scene.modified.is_some());
        assert_eq!(scene.annotations[0].labels[0].probability, 0.9);

        let mut prepared = scene.clone();
        prepared.prepare_for_post();
        assert!(prepared.modified.is_none());
        assert!(prepared.annotations[0].labels[0].source.is_none());
        assert_eq!(prepared.annotations[0].id.as_deref(), Some("a1"));

        let mut anonymous = scene;
        anonymous.deidentify();
        assert!(anonymous.id.is_none());
        assert!(anonymous.media_identifier.is_none());
        assert!(anonymous.annotations[0].id.is_none());
        assert_eq!(anonymous.annotations[0].labels[0].id.value(), "l1");
    }
}
