// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    Error,
    api::{DatasetID, PlatformVersion, ProductInfo, Project, ProjectID, WorkspaceID},
    convert::{SceneConverter, converter_for},
    labels::LabelMapping,
    media::{MediaItem, MediaKind},
    reader::AnnotationReader,
    scene::{Annotation, AnnotationKind, AnnotationScene},
    transport::Transport,
};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::mpsc::Sender;

/// Number of media items requested per listing page.
pub const MEDIA_PAGE_SIZE: usize = 500;

/// Progress information for long-running operations.
///
/// Bulk operations accept an optional `tokio::sync::mpsc::Sender<Progress>`
/// and report after every processed media item.
///
/// # Examples
///
/// ```rust
/// use scenesync_client::Progress;
///
/// let progress = Progress {
///     current: 25,
///     total: 100,
/// };
/// let percentage = (progress.current as f64 / progress.total as f64) * 100.0;
/// println!(
///     "Progress: {:.1}% ({}/{})",
///     percentage, progress.current, progress.total
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Current number of completed items.
    pub current: usize,
    /// Total number of items to process.
    pub total: usize,
}

#[derive(Deserialize)]
struct MediaPage {
    #[serde(default)]
    media_count: HashMap<String, usize>,
    #[serde(default)]
    media: Vec<Value>,
    #[serde(default)]
    next_page: Option<String>,
}

/// Synchronizes annotation scenes between a local annotation source and one
/// project on the annotation platform.
///
/// The client is bound to a single project for its lifetime. The scene
/// payload format is selected once from the platform version. Requests are
/// issued one after another; the client is not meant to be shared between
/// concurrent tasks.
///
/// # Examples
///
/// ```no_run
/// use scenesync_client::{
///     AnnotationClient, ClientConfig, HttpTransport, ProjectID, SceneFileReader, WorkspaceID,
/// };
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), scenesync_client::Error> {
/// let config = ClientConfig::load()?;
/// let transport = Arc::new(HttpTransport::new(&config)?);
/// let workspace: WorkspaceID = "6536a1c2d1b7f0e1a2b3c4d5".parse()?;
/// let project: ProjectID = "6536a1c2d1b7f0e1a2b3c4d6".parse()?;
///
/// let client = AnnotationClient::connect(transport, workspace, &project).await?;
/// let mut client = client.with_reader(Box::new(SceneFileReader::new("./export")));
///
/// let images = client.all_media(scenesync_client::MediaKind::Image).await?;
/// let uploaded = client.upload_annotations(&images, false, None).await?;
/// println!("Uploaded {} scenes", uploaded);
/// # Ok(())
/// # }
/// ```
pub struct AnnotationClient {
    transport: Arc<dyn Transport>,
    workspace_id: WorkspaceID,
    project: Project,
    version: PlatformVersion,
    converter: Box<dyn SceneConverter>,
    reader: Option<Box<dyn AnnotationReader>>,
    label_mapping: Option<LabelMapping>,
}

impl std::fmt::Debug for AnnotationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationClient")
            .field("workspace_id", &self.workspace_id)
            .field("project", &self.project.id())
            .field("version", &self.version)
            .field("converter", &self.converter.name())
            .field("reader", &self.reader.is_some())
            .finish()
    }
}

impl AnnotationClient {
    /// Creates a client for `project` on a platform running `version`.
    pub fn new(
        transport: Arc<dyn Transport>,
        workspace_id: WorkspaceID,
        project: Project,
        version: PlatformVersion,
    ) -> Self {
        let converter = converter_for(&version);
        AnnotationClient {
            transport,
            workspace_id,
            project,
            version,
            converter,
            reader: None,
            label_mapping: None,
        }
    }

    /// Creates a client after querying the platform version and the project.
    pub async fn connect(
        transport: Arc<dyn Transport>,
        workspace_id: WorkspaceID,
        project_id: &ProjectID,
    ) -> Result<Self, Error> {
        let version = platform_version(transport.as_ref()).await?;
        let url = format!("workspaces/{}/projects/{}", workspace_id, project_id);
        let project: Project = serde_json::from_value(transport.get(&url).await?)?;
        info!("Connected to project {} on platform {}", project, version);
        Ok(Self::new(transport, workspace_id, project, version))
    }

    /// Sets the source of annotations for uploads and resets the cached
    /// label mapping.
    pub fn with_reader(mut self, reader: Box<dyn AnnotationReader>) -> Self {
        self.reader = Some(reader);
        self.label_mapping = None;
        self
    }

    pub fn workspace_id(&self) -> &WorkspaceID {
        &self.workspace_id
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn version(&self) -> &PlatformVersion {
        &self.version
    }

    pub fn converter(&self) -> &dyn SceneConverter {
        self.converter.as_ref()
    }

    fn project_url(&self) -> String {
        format!(
            "workspaces/{}/projects/{}",
            self.workspace_id,
            self.project.id()
        )
    }

    /// Mapping of the reader's label names to the project's label ids.
    ///
    /// Computed on first use and cached until
    /// [`invalidate_label_mapping`](Self::invalidate_label_mapping) is called.
    /// Fails with [`Error::NoAnnotationSource`] when no reader is configured
    /// and with [`Error::UnmappedLabel`] when the reader uses a label the
    /// project does not define.
    pub fn label_mapping(&mut self) -> Result<&LabelMapping, Error> {
        let mapping = match self.label_mapping.take() {
            Some(mapping) => mapping,
            None => {
                let reader = self.reader.as_ref().ok_or(Error::NoAnnotationSource)?;
                let source_labels = reader.label_names()?;
                debug!(
                    "Mapping {} source labels to project {}",
                    source_labels.len(),
                    self.project
                );
                LabelMapping::resolve(&self.project, &source_labels)?
            }
        };
        let mapping: &LabelMapping = self.label_mapping.insert(mapping);
        Ok(mapping)
    }

    pub fn invalidate_label_mapping(&mut self) {
        self.label_mapping = None;
    }

    /// Lists all media of `kind` in a dataset, following the platform's
    /// pagination until the reported total is reached.
    pub async fn list_media(
        &self,
        dataset_id: &DatasetID,
        kind: MediaKind,
    ) -> Result<Vec<MediaItem>, Error> {
        let collection = format!(
            "{}/datasets/{}/media/{}",
            self.project_url(),
            dataset_id,
            kind.collection()
        );
        let mut url = format!("{}?top={}", collection, MEDIA_PAGE_SIZE);
        let mut media = Vec::new();

        loop {
            let page: MediaPage = serde_json::from_value(self.transport.get(&url).await?)?;
            let total = page
                .media_count
                .get(kind.collection())
                .copied()
                .unwrap_or(0);

            if page.media.is_empty() {
                break;
            }

            for value in page.media {
                media.push(MediaItem::from_rest(value, kind, &collection)?);
            }
            debug!("Listed {}/{} {} media items", media.len(), total, kind);

            if media.len() >= total {
                break;
            }

            match page.next_page {
                Some(next) if !next.is_empty() => url = next,
                _ => {
                    warn!(
                        "Dataset {} reports {} {} items but pagination ended after {}",
                        dataset_id,
                        total,
                        kind,
                        media.len()
                    );
                    break;
                }
            }
        }

        Ok(media)
    }

    pub async fn images(&self, dataset_id: &DatasetID) -> Result<Vec<MediaItem>, Error> {
        self.list_media(dataset_id, MediaKind::Image).await
    }

    pub async fn videos(&self, dataset_id: &DatasetID) -> Result<Vec<MediaItem>, Error> {
        self.list_media(dataset_id, MediaKind::Video).await
    }

    /// Lists all media of `kind` across every dataset of the project.
    pub async fn all_media(&self, kind: MediaKind) -> Result<Vec<MediaItem>, Error> {
        let mut media = Vec::new();
        for dataset in self.project.datasets() {
            media.extend(self.list_media(dataset.id(), kind).await?);
        }
        Ok(media)
    }

    /// Fetches the latest annotation scene of an image or video frame.
    ///
    /// Returns `None` when the platform has no annotation for the item,
    /// reported as status 204 or 404. Every other failure is returned.
    pub async fn latest_scene(&self, item: &MediaItem) -> Result<Option<AnnotationScene>, Error> {
        let url = item.latest_annotation_url()?;
        match self.transport.get(&url).await {
            Ok(Value::Null) => Ok(None),
            Ok(value) => Ok(Some(
                self.converter.from_transport(value, item.dimensions())?,
            )),
            Err(err) if matches!(err.status(), Some(204) | Some(404)) => {
                debug!("No annotation for {}", item);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn read_from_source(
        &mut self,
        item: &MediaItem,
        preserve_shape_for_global_labels: bool,
    ) -> Result<Vec<Annotation>, Error> {
        self.label_mapping()?;
        match (&self.reader, &self.label_mapping) {
            (Some(reader), Some(mapping)) => reader.get_data(
                &item.file_base(),
                mapping,
                item.dimensions(),
                preserve_shape_for_global_labels,
            ),
            _ => Err(Error::NoAnnotationSource),
        }
    }

    /// Uploads an annotation scene for an image or video frame, replacing
    /// its current annotations.
    ///
    /// Without a `scene`, the annotations are read from the configured
    /// reader. Scenes without annotations are not sent. Returns the scene as
    /// prepared for upload.
    pub async fn replace_scene(
        &mut self,
        item: &MediaItem,
        scene: Option<AnnotationScene>,
    ) -> Result<AnnotationScene, Error> {
        let url = item.annotations_url()?;
        let mut scene = match scene {
            Some(scene) => scene.apply_identifier(item.identifier()),
            None => {
                if self.reader.is_none() {
                    return Err(Error::NoAnnotationSource);
                }
                let annotations = self.read_from_source(item, false)?;
                AnnotationScene::new(item.identifier(), annotations, AnnotationKind::Annotation)
            }
        };

        if scene.has_data() {
            scene.prepare_for_post();
            let mut body = self
                .converter
                .to_transport(&scene, item.dimensions(), false)?;
            remove_fields(&mut body, &["kind"]);
            self.transport.post(&url, &body).await?;
            debug!(
                "Uploaded {} annotations for {}",
                scene.annotations.len(),
                item
            );
        } else {
            debug!("No annotations to upload for {}", item);
        }

        Ok(scene)
    }

    /// Appends the reader's annotations for an image or video frame to the
    /// annotations already on the platform.
    ///
    /// Returns the scene stored by the platform, or the merged scene when
    /// there was nothing to upload.
    pub async fn append_scene(&mut self, item: &MediaItem) -> Result<AnnotationScene, Error> {
        let url = item.annotations_url()?;
        let new_annotations = self.read_from_source(item, true)?;

        let mut scene = match self.latest_scene(item).await? {
            Some(scene) => scene,
            None => {
                info!("No existing annotation found for {}", item);
                AnnotationScene::new(item.identifier(), vec![], AnnotationKind::Annotation)
            }
        };
        scene.extend(new_annotations);

        if !scene.has_data() {
            return Ok(scene);
        }

        let mut body = self
            .converter
            .to_transport(&scene, item.dimensions(), false)?;
        remove_fields(&mut body, &["kind", "annotation_state_per_task", "id"]);
        let response = self.transport.post(&url, &body).await?;
        self.converter.from_transport(response, item.dimensions())
    }

    /// Uploads annotations from the reader for every item, replacing or
    /// appending to the existing ones. Returns the number of items for which
    /// annotations were uploaded.
    pub async fn upload_annotations(
        &mut self,
        items: &[MediaItem],
        append: bool,
        progress: Option<Sender<Progress>>,
    ) -> Result<usize, Error> {
        for item in items {
            item.ensure_annotatable()?;
        }
        self.label_mapping()?;

        let total = items.len();
        let mut uploaded = 0;

        for (index, item) in items.iter().enumerate() {
            let scene = if append {
                self.append_scene(item).await?
            } else {
                self.replace_scene(item, None).await?
            };
            if scene.has_data() {
                uploaded += 1;
            }

            if let Some(progress) = &progress {
                let _ = progress
                    .send(Progress {
                        current: index + 1,
                        total,
                    })
                    .await;
            }
        }

        if uploaded > 0 {
            info!("Upload complete. Uploaded {} new annotations", uploaded);
        } else {
            info!("No new annotations were found.");
        }
        Ok(uploaded)
    }
}

/// Queries the platform version from its product info endpoint.
pub async fn platform_version(transport: &dyn Transport) -> Result<PlatformVersion, Error> {
    let info: ProductInfo = serde_json::from_value(transport.get("product_info").await?)?;
    debug!(
        "Platform version {} (build {})",
        info.product_version,
        info.build_version.as_deref().unwrap_or("unknown")
    );
    info.product_version.parse()
}

fn remove_fields(body: &mut Value, fields: &[&str]) {
    if let Some(object) = body.as_object_mut() {
        for field in fields {
            object.remove(*field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{Dataset, Label, Task},
        media::{Dimensions, Image, Video},
        scene::{ScoredLabel, Shape},
        transport::mock::MockTransport,
    };
    use serde_json::json;

    const PROJECT: &str = "workspaces/w1/projects/p1";
    const IMAGES: &str = "workspaces/w1/projects/p1/datasets/d1/media/images";
    const CAT: &str = "workspaces/w1/projects/p1/datasets/d1/media/images/i1";

    fn project() -> Project {
        Project::new(
            "p1".try_into().unwrap(),
            "Animals",
            vec![Task::new(
                "detection",
                vec![
                    Label::new("l1".try_into().unwrap(), "cat"),
                    Label::new("l2".try_into().unwrap(), "dog"),
                ],
            )],
            vec![Dataset::new("d1".try_into().unwrap(), "Dataset")],
        )
    }

    fn client(transport: Arc<MockTransport>) -> AnnotationClient {
        AnnotationClient::new(
            transport,
            "w1".try_into().unwrap(),
            project(),
            PlatformVersion::new(1, 8, 0),
        )
    }

    fn image() -> MediaItem {
        Image::new(
            "i1".try_into().unwrap(),
            "cat.jpg",
            Dimensions::new(640, 480),
            CAT,
        )
        .into()
    }

    fn rectangle(x: f64) -> Shape {
        Shape::Rectangle {
            x,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        }
    }

    fn scene_json(label: &str, x: f64) -> Value {
        json!({
            "id": "s1",
            "kind": "annotation",
            "media_identifier": {"type": "image", "image_id": "i1"},
            "annotation_state_per_task": [{"task_id": "t1", "state": "annotated"}],
            "annotations": [{
                "id": "a1",
                "labels": [{"id": label, "name": "cat", "probability": 1.0}],
                "shape": {"type": "RECTANGLE", "x": x, "y": 0.0, "width": 10.0, "height": 10.0}
            }]
        })
    }

    struct StaticReader(Vec<Annotation>);

    impl AnnotationReader for StaticReader {
        fn label_names(&self) -> Result<Vec<String>, Error> {
            Ok(self
                .0
                .iter()
                .flat_map(|a| a.label_names())
                .map(String::from)
                .collect())
        }

        fn get_data(
            &self,
            _file_base: &str,
            mapping: &LabelMapping,
            _dimensions: Dimensions,
            _preserve_shape_for_global_labels: bool,
        ) -> Result<Vec<Annotation>, Error> {
            Ok(self
                .0
                .iter()
                .cloned()
                .map(|mut annotation| {
                    for label in &mut annotation.labels {
                        if let Some(id) = label.name.as_deref().and_then(|n| mapping.id(n)) {
                            label.id = id.clone();
                        }
                    }
                    annotation
                })
                .collect())
        }
    }

    fn dog_reader() -> Box<dyn AnnotationReader> {
        Box::new(StaticReader(vec![Annotation::new(
            rectangle(20.0),
            vec![ScoredLabel::new("local".try_into().unwrap(), "dog")],
        )]))
    }

    #[tokio::test]
    async fn test_connect() {
        let transport = Arc::new(
            MockTransport::new()
                .on_get(
                    "product_info",
                    json!({"product-version": "1.1.0", "build-version": "1.1.0-release-20230101"}),
                )
                .on_get(
                    PROJECT,
                    json!({"id": "p1", "name": "Animals", "pipeline": {"tasks": []}}),
                ),
        );
        let client =
            AnnotationClient::connect(transport, "w1".try_into().unwrap(), &"p1".parse().unwrap())
                .await
                .unwrap();
        assert_eq!(client.version(), &PlatformVersion::new(1, 1, 0));
        assert_eq!(client.converter().name(), "normalized");
        assert_eq!(client.project().name(), "Animals");
    }

    #[tokio::test]
    async fn test_list_media_pagination() {
        let item = |id: &str| {
            json!({"id": id, "name": format!("{}.jpg", id), "type": "image",
                   "media_information": {"width": 10, "height": 10}})
        };
        let next = format!("{}?top=500&skip=2", IMAGES);
        let transport = Arc::new(
            MockTransport::new()
                .on_get(
                    &format!("{}?top=500", IMAGES),
                    json!({"media_count": {"images": 3}, "media": [item("a"), item("b")],
                           "next_page": next}),
                )
                .on_get(
                    &next,
                    json!({"media_count": {"images": 3}, "media": [item("c")]}),
                ),
        );
        let client = client(transport.clone());
        let media = client.images(&"d1".parse().unwrap()).await.unwrap();
        let names: Vec<&str> = media.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(media[2].base_url(), format!("{}/c", IMAGES));
        assert_eq!(transport.count("GET"), 2);
    }

    #[tokio::test]
    async fn test_list_media_stops_without_next_page() {
        let transport = Arc::new(MockTransport::new().on_get(
            &format!("{}?top=500", IMAGES),
            json!({"media_count": {"images": 10}, "media": [
                {"id": "a", "name": "a.jpg", "media_information": {"width": 1, "height": 1}}
            ]}),
        ));
        let client = client(transport.clone());
        let media = client.all_media(MediaKind::Image).await.unwrap();
        assert_eq!(media.len(), 1);
        assert_eq!(transport.count("GET"), 1);
    }

    #[tokio::test]
    async fn test_list_media_propagates_errors() {
        let transport =
            Arc::new(MockTransport::new().on_get_status(&format!("{}?top=500", IMAGES), 500));
        let err = client(transport)
            .images(&"d1".parse().unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_latest_scene_absent() {
        let latest = format!("{}/annotations/latest", CAT);

        let transport = Arc::new(MockTransport::new().on_get_status(&latest, 204));
        assert!(client(transport).latest_scene(&image()).await.unwrap().is_none());

        let transport = Arc::new(MockTransport::new());
        assert!(client(transport).latest_scene(&image()).await.unwrap().is_none());

        let transport = Arc::new(MockTransport::new().on_get_status(&latest, 500));
        let err = client(transport).latest_scene(&image()).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_latest_scene_rejects_video() {
        let video: MediaItem = Video::new(
            "v1".try_into().unwrap(),
            "clip.mp4",
            Dimensions::new(10, 10),
            100,
            10,
            "videos/v1",
        )
        .into();
        let transport = Arc::new(MockTransport::new());
        let result = client(transport.clone()).latest_scene(&video).await;
        assert!(matches!(result, Err(Error::UnsupportedMediaType(_))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_replace_scene_with_scene() {
        let transport = Arc::new(MockTransport::new());
        let mut client = client(transport.clone());
        let scene = AnnotationScene {
            annotations: vec![Annotation::new(
                Shape::Rectangle {
                    x: 20.0,
                    y: 20.0,
                    width: -10.0,
                    height: 5.0,
                },
                vec![ScoredLabel::new("l1".try_into().unwrap(), "cat")],
            )],
            ..Default::default()
        };

        let uploaded = client.replace_scene(&image(), Some(scene)).await.unwrap();
        assert_eq!(uploaded.media_identifier, Some(image().identifier()));
        assert_eq!(
            uploaded.annotations[0].shape,
            Shape::Rectangle {
                x: 10.0,
                y: 20.0,
                width: 10.0,
                height: 5.0
            }
        );

        let posted = transport.posted(&format!("{}/annotations", CAT));
        assert_eq!(posted.len(), 1);
        assert!(posted[0].get("kind").is_none());
        assert_eq!(posted[0]["media_identifier"]["image_id"], json!("i1"));
    }

    #[tokio::test]
    async fn test_replace_scene_empty_skips_post() {
        let transport = Arc::new(MockTransport::new());
        let mut client = client(transport.clone());
        let scene = client
            .replace_scene(&image(), Some(AnnotationScene::default()))
            .await
            .unwrap();
        assert!(!scene.has_data());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_replace_scene_without_source() {
        let mut client = client(Arc::new(MockTransport::new()));
        assert!(matches!(
            client.replace_scene(&image(), None).await,
            Err(Error::NoAnnotationSource)
        ));
        assert!(matches!(
            client.append_scene(&image()).await,
            Err(Error::NoAnnotationSource)
        ));
    }

    #[tokio::test]
    async fn test_append_scene_keeps_existing_first() {
        let transport = Arc::new(
            MockTransport::new()
                .on_get(&format!("{}/annotations/latest", CAT), scene_json("l1", 1.0)),
        );
        let mut client = client(transport.clone()).with_reader(dog_reader());

        let scene = client.append_scene(&image()).await.unwrap();
        let names: Vec<Vec<&str>> = scene.annotations.iter().map(|a| a.label_names()).collect();
        assert_eq!(names, vec![vec!["cat"], vec!["dog"]]);
        assert_eq!(scene.annotations[1].labels[0].id.value(), "l2");

        let posted = transport.posted(&format!("{}/annotations", CAT));
        assert_eq!(posted.len(), 1);
        let body = posted[0].as_object().unwrap();
        assert!(!body.contains_key("kind"));
        assert!(!body.contains_key("id"));
        assert!(!body.contains_key("annotation_state_per_task"));
        assert_eq!(body["annotations"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_append_scene_without_remote() {
        let transport = Arc::new(MockTransport::new());
        let mut client = client(transport.clone()).with_reader(dog_reader());

        let scene = client.append_scene(&image()).await.unwrap();
        assert_eq!(scene.annotations.len(), 1);
        assert_eq!(scene.annotations[0].label_names(), vec!["dog"]);
        assert_eq!(transport.count("POST"), 1);
    }

    #[tokio::test]
    async fn test_append_scene_nothing_to_upload() {
        let transport = Arc::new(MockTransport::new());
        let mut client = client(transport.clone()).with_reader(Box::new(StaticReader(vec![])));
        let scene = client.append_scene(&image()).await.unwrap();
        assert!(!scene.has_data());
        assert_eq!(scene.kind, AnnotationKind::Annotation);
        assert_eq!(transport.count("POST"), 0);
    }

    #[tokio::test]
    async fn test_append_scene_returns_stored_scene() {
        let transport = Arc::new(
            MockTransport::new().on_post(&format!("{}/annotations", CAT), scene_json("l2", 42.0)),
        );
        let mut client = client(transport).with_reader(dog_reader());

        let scene = client.append_scene(&image()).await.unwrap();
        assert_eq!(scene.annotations.len(), 1);
        assert_eq!(scene.annotations[0].shape, rectangle(42.0));
    }

    #[tokio::test]
    async fn test_append_scene_post_failure() {
        let transport = Arc::new(
            MockTransport::new().on_post_status(&format!("{}/annotations", CAT), 500),
        );
        let mut client = client(transport.clone()).with_reader(dog_reader());

        let err = client.append_scene(&image()).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(transport.count("POST"), 1);

        let result = client.upload_annotations(&[image()], true, None).await;
        assert_eq!(result.unwrap_err().status(), Some(500));
    }

    #[tokio::test]
    async fn test_label_mapping_cached_and_invalidated() {
        let mut client = client(Arc::new(MockTransport::new())).with_reader(dog_reader());
        assert_eq!(client.label_mapping().unwrap().id("cat").unwrap().value(), "l1");
        assert!(client.label_mapping.is_some());
        client.invalidate_label_mapping();
        assert!(client.label_mapping.is_none());

        let bird = Box::new(StaticReader(vec![Annotation::new(
            rectangle(0.0),
            vec![ScoredLabel::new("x".try_into().unwrap(), "bird")],
        )]));
        let mut client = client.with_reader(bird);
        assert!(matches!(
            client.label_mapping(),
            Err(Error::UnmappedLabel(name)) if name == "bird"
        ));
    }

    #[tokio::test]
    async fn test_upload_annotations_counts_and_progress() {
        let transport = Arc::new(MockTransport::new());
        let mut client = client(transport.clone()).with_reader(dog_reader());
        let (tx, mut rx) = tokio::sync::mpsc::channel(8);

        let uploaded = client
            .upload_annotations(&[image(), image()], false, Some(tx))
            .await
            .unwrap();
        assert_eq!(uploaded, 2);
        assert_eq!(transport.count("POST"), 2);

        let mut last = None;
        while let Some(progress) = rx.recv().await {
            last = Some(progress);
        }
        assert_eq!(last, Some(Progress { current: 2, total: 2 }));
    }
}
