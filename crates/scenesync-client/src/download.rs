// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    Error,
    client::{AnnotationClient, Progress},
    convert::{GenericConverter, SceneConverter},
    media::{MediaItem, MediaKind, file_stem},
    scene::AnnotationKind,
};
use log::info;
use std::{path::Path, time::Instant};
use tokio::sync::mpsc::Sender;

/// Name of the file an item's annotation scene is saved to.
///
/// The name is based on the item's [file base](MediaItem::file_base). With
/// `append_uid`, the platform id is added so that items sharing a name don't
/// collide:
///
/// - image `cat.png` with id `abc`: `cat_abc.json`
/// - frame 7 of video `3` named `clip.mp4`: `clip_3_frame_7.json`
///
/// When the parent video's name is unknown, the video part is the frame name
/// without its trailing `_frame_<n>`. Whole videos have no single scene and
/// are rejected with [`Error::UnsupportedMediaType`] when `append_uid` is
/// set.
///
/// ```rust
/// use scenesync_client::{Dimensions, Image, MediaItem, derive_filename};
///
/// let image: MediaItem = Image::new(
///     "abc".parse().unwrap(),
///     "cat.png",
///     Dimensions::new(640, 480),
///     "media/images/abc",
/// )
/// .into();
/// assert_eq!(derive_filename(&image, false).unwrap(), "cat.json");
/// assert_eq!(derive_filename(&image, true).unwrap(), "cat_abc.json");
/// ```
pub fn derive_filename(item: &MediaItem, append_uid: bool) -> Result<String, Error> {
    let base = item.file_base();
    if !append_uid {
        return Ok(format!("{}.json", base));
    }

    match item {
        MediaItem::Image(image) => Ok(format!("{}_{}.json", base, image.id())),
        MediaItem::VideoFrame(frame) => {
            let video = match frame.video_name() {
                Some(name) => file_stem(name),
                None => base
                    .rsplit_once("_frame_")
                    .map(|(video, _)| video.to_string())
                    .unwrap_or(base.clone()),
            };
            Ok(format!(
                "{}_{}_frame_{}.json",
                video,
                frame.video_id(),
                frame.frame_index()
            ))
        }
        MediaItem::Video(video) => Err(Error::UnsupportedMediaType(format!(
            "video '{}' has no single annotation file, download its frames instead",
            video.name()
        ))),
    }
}

fn plural(items: &[MediaItem]) -> &'static str {
    let frames = items
        .iter()
        .filter(|item| matches!(item, MediaItem::VideoFrame(_)))
        .count();
    match frames {
        0 => "images",
        n if n == items.len() => "video frames",
        _ => "media items",
    }
}

impl AnnotationClient {
    /// Downloads the latest annotation scene of every item into
    /// `{folder}/annotations`, one pretty-printed JSON file per item.
    ///
    /// Items without an annotation, or whose latest scene is not a user
    /// annotation, are skipped. Any other failure aborts the download.
    /// Scenes are written in pixel coordinates without platform ids,
    /// regardless of the platform version. Returns the elapsed time in
    /// seconds.
    pub async fn download_annotations<P: AsRef<Path>>(
        &self,
        items: &[MediaItem],
        folder: P,
        append_uid: bool,
        progress: Option<Sender<Progress>>,
    ) -> Result<f64, Error> {
        for item in items {
            item.ensure_annotatable()?;
        }

        let path = folder.as_ref().join("annotations");
        tokio::fs::create_dir_all(&path).await?;

        let plural = plural(items);
        info!(
            "Starting annotation download... saving annotations for {} {} to folder {:?}",
            items.len(),
            plural,
            path
        );

        let start = Instant::now();
        let total = items.len();
        let mut downloaded = 0;
        let mut skipped = 0;

        for (index, item) in items.iter().enumerate() {
            match self.latest_scene(item).await? {
                None => {
                    info!(
                        "Unable to retrieve latest annotation for {}. Skipping this {}",
                        item,
                        item.kind_name()
                    );
                    skipped += 1;
                }
                Some(scene) if scene.kind != AnnotationKind::Annotation => {
                    info!(
                        "Received annotation of kind {} for {}, skipping",
                        scene.kind, item
                    );
                    skipped += 1;
                }
                Some(scene) => {
                    let export = GenericConverter.to_transport(&scene, item.dimensions(), true)?;
                    let filename = derive_filename(item, append_uid)?;
                    tokio::fs::write(path.join(filename), serde_json::to_string_pretty(&export)?)
                        .await?;
                    downloaded += 1;
                }
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

        let elapsed = start.elapsed().as_secs_f64();
        let mut msg = if downloaded > 0 {
            format!(
                "Downloaded {} annotations to folder {:?} in {:.1} seconds.",
                downloaded, path, elapsed
            )
        } else {
            "No annotations were downloaded.".to_string()
        };
        if skipped > 0 {
            msg.push_str(&format!(
                " Was unable to retrieve annotations for {} {}, these {} were skipped.",
                skipped, plural, plural
            ));
        }
        info!("{}", msg);

        Ok(elapsed)
    }

    /// Downloads the annotations of every image in every dataset of the
    /// project. Returns the elapsed time in seconds.
    pub async fn download_all_annotations<P: AsRef<Path>>(
        &self,
        folder: P,
        append_uid: bool,
        progress: Option<Sender<Progress>>,
    ) -> Result<f64, Error> {
        let images = self.all_media(MediaKind::Image).await?;
        self.download_annotations(&images, folder, append_uid, progress)
            .await
    }
}
