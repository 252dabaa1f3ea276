// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Conversion of annotation scenes to and from the platform's REST payloads.
//!
//! Two payload flavours exist. Current platforms exchange shapes in pixel
//! coordinates ([`GenericConverter`]). Platforms before 1.2 exchange shapes
//! normalized to the image size ([`NormalizedConverter`]) and therefore need
//! the media dimensions in both directions. The flavour is chosen once per
//! client by [`converter_for`].

use crate::{Error, api::PlatformVersion, media::Dimensions, scene::AnnotationScene};
use log::debug;
use serde_json::Value;

/// Converts annotation scenes to and from REST payloads.
pub trait SceneConverter: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Serializes `scene` into a REST payload. With `deidentify` set, all
    /// platform identifiers are removed from the payload.
    fn to_transport(
        &self,
        scene: &AnnotationScene,
        dimensions: Dimensions,
        deidentify: bool,
    ) -> Result<Value, Error>;

    /// Parses a REST payload into a scene with pixel coordinates.
    fn from_transport(
        &self,
        value: Value,
        dimensions: Dimensions,
    ) -> Result<AnnotationScene, Error>;
}

/// Payloads in pixel coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericConverter;

impl SceneConverter for GenericConverter {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn to_transport(
        &self,
        scene: &AnnotationScene,
        _dimensions: Dimensions,
        deidentify: bool,
    ) -> Result<Value, Error> {
        if deidentify {
            let mut scene = scene.clone();
            scene.deidentify();
            Ok(serde_json::to_value(&scene)?)
        } else {
            Ok(serde_json::to_value(scene)?)
        }
    }

    fn from_transport(
        &self,
        value: Value,
        _dimensions: Dimensions,
    ) -> Result<AnnotationScene, Error> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Payloads with coordinates relative to the image size, used by legacy
/// platforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedConverter;

fn check_dimensions(dimensions: Dimensions) -> Result<(), Error> {
    if dimensions.width == 0 || dimensions.height == 0 {
        return Err(Error::InvalidParameters(format!(
            "normalized annotations need non-zero media dimensions, got {}x{}",
            dimensions.width, dimensions.height
        )));
    }
    Ok(())
}

impl SceneConverter for NormalizedConverter {
    fn name(&self) -> &'static str {
        "normalized"
    }

    fn to_transport(
        &self,
        scene: &AnnotationScene,
        dimensions: Dimensions,
        deidentify: bool,
    ) -> Result<Value, Error> {
        check_dimensions(dimensions)?;

        let mut scene = scene.clone();
        if deidentify {
            scene.deidentify();
        }
        for annotation in &mut scene.annotations {
            annotation.shape = annotation.shape.normalized(dimensions);
        }
        Ok(serde_json::to_value(&scene)?)
    }

    fn from_transport(
        &self,
        value: Value,
        dimensions: Dimensions,
    ) -> Result<AnnotationScene, Error> {
        check_dimensions(dimensions)?;

        let mut scene: AnnotationScene = serde_json::from_value(value)?;
        for annotation in &mut scene.annotations {
            annotation.shape = annotation.shape.denormalized(dimensions);
        }
        Ok(scene)
    }
}

/// Selects the payload converter for a platform version.
pub fn converter_for(version: &PlatformVersion) -> Box<dyn SceneConverter> {
    let converter: Box<dyn SceneConverter> = if version.is_legacy() {
        Box::new(NormalizedConverter)
    } else {
        Box::new(GenericConverter)
    };
    debug!(
        "Using {} annotation converter for platform {}",
        converter.name(),
        version
    );
    converter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        media::MediaIdentifier,
        scene::{Annotation, AnnotationKind, Point, ScoredLabel, Shape},
    };
    use serde_json::json;

    fn scene() -> AnnotationScene {
        let labels = vec![ScoredLabel::new("l1".try_into().unwrap(), "cat")];
        let mut annotation = Annotation::new(
            Shape::Rectangle {
                x: 64.0,
                y: 32.0,
                width: 128.0,
                height: 16.0,
            },
            labels.clone(),
        );
        annotation.id = Some("a1".to_string());
        let polygon = Annotation::new(
            Shape::Polygon {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(256.0, 0.0),
                    Point::new(128.0, 64.0),
                ],
            },
            labels,
        );
        let mut scene = AnnotationScene::new(
            MediaIdentifier::Image {
                image_id: "i1".try_into().unwrap(),
            },
            vec![annotation, polygon],
            AnnotationKind::Annotation,
        );
        scene.id = Some("s1".to_string());
        scene
    }

    const DIMS: Dimensions = Dimensions {
        width: 256,
        height: 128,
    };

    #[test]
    fn test_generic_round_trip() {
        let converter = GenericConverter;
        let value = converter.to_transport(&scene(), DIMS, false).unwrap();
        assert_eq!(value["annotations"][0]["shape"]["x"], json!(64.0));
        assert_eq!(value["kind"], json!("annotation"));
        assert_eq!(value["id"], json!("s1"));

        let parsed = converter.from_transport(value, DIMS).unwrap();
        assert_eq!(parsed.annotations, scene().annotations);
    }

    #[test]
    fn test_normalized_round_trip() {
        let converter = NormalizedConverter;
        let value = converter.to_transport(&scene(), DIMS, false).unwrap();
        assert_eq!(value["annotations"][0]["shape"]["x"], json!(0.25));
        assert_eq!(value["annotations"][0]["shape"]["height"], json!(0.125));
        assert_eq!(value["annotations"][1]["shape"]["points"][1]["x"], json!(1.0));

        let parsed = converter.from_transport(value, DIMS).unwrap();
        assert_eq!(parsed.annotations, scene().annotations);
    }

    #[test]
    fn test_deidentify_strips_ids() {
        let value = GenericConverter.to_transport(&scene(), DIMS, true).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("media_identifier").is_none());
        assert!(value["annotations"][0].get("id").is_none());
        assert_eq!(value["annotations"][0]["labels"][0]["id"], json!("l1"));
    }

    #[test]
    fn test_normalized_requires_dimensions() {
        let result = NormalizedConverter.to_transport(&scene(), Dimensions::new(0, 10), false);
        assert!(matches!(result, Err(Error::InvalidParameters(_))));
    }

    #[test]
    fn test_converter_for_version() {
        let legacy = converter_for(&PlatformVersion::new(1, 1, 0));
        assert_eq!(legacy.name(), "normalized");
        let current = converter_for(&PlatformVersion::new(1, 8, 0));
        assert_eq!(current.name(), "generic");
    }
}
