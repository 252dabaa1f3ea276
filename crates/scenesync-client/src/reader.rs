// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Local sources of annotation data.

use crate::{
    Error,
    labels::LabelMapping,
    media::Dimensions,
    scene::{Annotation, AnnotationScene, ScoredLabel, Shape},
};
use log::{debug, warn};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

/// A local source of annotations, keyed by the media item's
/// [file base](crate::MediaItem::file_base).
pub trait AnnotationReader: Send + Sync {
    /// Every label name used by the source.
    fn label_names(&self) -> Result<Vec<String>, Error>;

    /// Reads the annotations for the media item with file base `file_base`, with label
    /// names translated to platform ids through `label_mapping`.
    ///
    /// Unless `preserve_shape_for_global_labels` is set, annotations carrying
    /// only global labels get a shape covering the full media item.
    fn get_data(
        &self,
        file_base: &str,
        label_mapping: &LabelMapping,
        dimensions: Dimensions,
        preserve_shape_for_global_labels: bool,
    ) -> Result<Vec<Annotation>, Error>;
}

/// Reads annotation files written by
/// [`AnnotationClient::download_annotations`](crate::AnnotationClient::download_annotations).
///
/// The reader expects one `{file base}.json` file per media item, either
/// directly in the given folder or in its `annotations` subfolder.
///
/// # Example
///
/// ```rust,no_run
/// use scenesync_client::SceneFileReader;
///
/// let reader = SceneFileReader::new("./export").with_global_labels(vec!["indoor".into()]);
/// ```
#[derive(Debug, Clone)]
pub struct SceneFileReader {
    folder: PathBuf,
    global_labels: Vec<String>,
}

impl SceneFileReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let annotations = path.join("annotations");
        let folder = if annotations.is_dir() {
            annotations
        } else {
            path.to_path_buf()
        };

        SceneFileReader {
            folder,
            global_labels: Vec::new(),
        }
    }

    /// Names of labels that apply to a whole media item.
    pub fn with_global_labels(mut self, global_labels: Vec<String>) -> Self {
        self.global_labels = global_labels;
        self
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    fn read_scene(path: &Path) -> Result<AnnotationScene, Error> {
        let file = File::open(path)?;
        let scene = serde_json::from_reader(BufReader::new(file))?;
        Ok(scene)
    }

    fn scene_files(&self) -> Result<Vec<PathBuf>, Error> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.folder)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn is_global(&self, annotation: &Annotation) -> bool {
        !annotation.labels.is_empty()
            && annotation.labels.iter().all(|label| {
                label
                    .name
                    .as_ref()
                    .is_some_and(|name| self.global_labels.contains(name))
            })
    }
}

impl AnnotationReader for SceneFileReader {
    fn label_names(&self) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = Vec::new();
        for path in self.scene_files()? {
            let scene = Self::read_scene(&path)?;
            for name in scene.label_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    fn get_data(
        &self,
        file_base: &str,
        label_mapping: &LabelMapping,
        dimensions: Dimensions,
        preserve_shape_for_global_labels: bool,
    ) -> Result<Vec<Annotation>, Error> {
        let path = self.folder.join(format!("{}.json", file_base));
        if !path.is_file() {
            debug!("No annotation file for {} at {:?}", file_base, path);
            return Ok(vec![]);
        }

        let scene = Self::read_scene(&path)?;
        let mut annotations = Vec::with_capacity(scene.annotations.len());

        for annotation in scene.annotations {
            let mut labels = Vec::with_capacity(annotation.labels.len());
            for label in &annotation.labels {
                let Some(name) = &label.name else {
                    warn!("Skipping unnamed label {} in {:?}", label.id, path);
                    continue;
                };
                let id = label_mapping
                    .id(name)
                    .ok_or_else(|| Error::UnmappedLabel(name.clone()))?;
                labels.push(ScoredLabel {
                    id: id.clone(),
                    name: Some(name.clone()),
                    probability: label.probability,
                    color: label.color.clone(),
                    source: None,
                });
            }

            if labels.is_empty() {
                continue;
            }

            let mut mapped = Annotation::new(annotation.shape, labels);
            if !preserve_shape_for_global_labels && self.is_global(&mapped) {
                mapped.shape = Shape::full_image(dimensions);
            }
            annotations.push(mapped);
        }

        Ok(annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Label, Project, Task};
    use serde_json::json;
    use std::fs;

    fn mapping() -> LabelMapping {
        let project = Project::new(
            "p1".try_into().unwrap(),
            "Test",
            vec![Task::new(
                "detection",
                vec![
                    Label::new("new-cat".try_into().unwrap(), "cat"),
                    Label::new("new-indoor".try_into().unwrap(), "indoor"),
                ],
            )],
            vec![],
        );
        LabelMapping::resolve(&project, &[]).unwrap()
    }

    fn write_scene(folder: &Path, name: &str) {
        let scene = json!({
            "kind": "annotation",
            "annotations": [
                {
                    "labels": [{"id": "old-cat", "name": "cat", "probability": 1.0}],
                    "shape": {"type": "RECTANGLE", "x": 5, "y": 5, "width": 10, "height": 10}
                },
                {
                    "labels": [{"id": "old-indoor", "name": "indoor", "probability": 1.0}],
                    "shape": {"type": "RECTANGLE", "x": 1, "y": 1, "width": 2, "height": 2}
                }
            ]
        });
        fs::write(
            folder.join(format!("{}.json", name)),
            serde_json::to_string_pretty(&scene).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_reads_annotations_subfolder() {
        let dir = tempfile::tempdir().unwrap();
        let annotations = dir.path().join("annotations");
        fs::create_dir_all(&annotations).unwrap();
        write_scene(&annotations, "cat");

        let reader = SceneFileReader::new(dir.path());
        assert_eq!(reader.folder(), annotations.as_path());
        assert_eq!(reader.label_names().unwrap(), vec!["cat", "indoor"]);
    }

    #[test]
    fn test_get_data_maps_labels_and_global_shapes() {
        let dir = tempfile::tempdir().unwrap();
        write_scene(dir.path(), "cat");
        let reader =
            SceneFileReader::new(dir.path()).with_global_labels(vec!["indoor".to_string()]);
        let dims = Dimensions::new(100, 50);

        let annotations = reader.get_data("cat", &mapping(), dims, false).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].labels[0].id.value(), "new-cat");
        assert_eq!(annotations[1].labels[0].id.value(), "new-indoor");
        assert_eq!(annotations[1].shape, Shape::full_image(dims));

        let preserved = reader.get_data("cat", &mapping(), dims, true).unwrap();
        assert_eq!(
            preserved[1].shape,
            Shape::Rectangle {
                x: 1.0,
                y: 1.0,
                width: 2.0,
                height: 2.0
            }
        );
    }

    #[test]
    fn test_get_data_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let reader = SceneFileReader::new(dir.path());
        let annotations = reader
            .get_data("nothing", &mapping(), Dimensions::new(1, 1), false)
            .unwrap();
        assert!(annotations.is_empty());
    }

    #[test]
    fn test_get_data_unmapped_label() {
        let dir = tempfile::tempdir().unwrap();
        write_scene(dir.path(), "cat");
        let project = Project::new("p1".try_into().unwrap(), "Empty", vec![], vec![]);
        let mapping = LabelMapping::resolve(&project, &[]).unwrap();
        let reader = SceneFileReader::new(dir.path());
        assert!(matches!(
            reader.get_data("cat", &mapping, Dimensions::new(1, 1), false),
            Err(Error::UnmappedLabel(name)) if name == "cat"
        ));
    }
}
