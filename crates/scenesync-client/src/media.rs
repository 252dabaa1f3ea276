// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{Error, api::MediaID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, path::Path, str::FromStr};

/// Kind of media collection that can be listed from a dataset.
///
/// # Examples
///
/// ```rust
/// use scenesync_client::MediaKind;
///
/// let kind: MediaKind = "images".parse().unwrap();
/// assert_eq!(kind, MediaKind::Image);
/// assert_eq!(kind.collection(), "images");
/// assert!("audio".parse::<MediaKind>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Name of the REST collection holding media of this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" | "images" => Ok(MediaKind::Image),
            "video" | "videos" => Ok(MediaKind::Video),
            _ => Err(Error::InvalidMediaType(s.to_string())),
        }
    }
}

impl TryFrom<&str> for MediaKind {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        MediaKind::from_str(s)
    }
}

/// Pixel dimensions of an image or video.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Dimensions { width, height }
    }
}

/// Identifies the media item an annotation scene belongs to.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaIdentifier {
    Image { image_id: MediaID },
    Video { video_id: MediaID },
    VideoFrame { video_id: MediaID, frame_index: u64 },
}

#[derive(Deserialize)]
struct MediaInformationRaw {
    width: u32,
    height: u32,
    #[serde(default)]
    frame_count: Option<u64>,
    #[serde(default)]
    frame_stride: Option<u64>,
    #[serde(default)]
    frame_rate: Option<f64>,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Deserialize)]
struct MediaRaw {
    id: MediaID,
    name: String,
    #[serde(rename = "type", default)]
    media_type: Option<String>,
    #[serde(default)]
    upload_time: Option<String>,
    media_information: MediaInformationRaw,
}

/// An image in a dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    id: MediaID,
    name: String,
    dimensions: Dimensions,
    upload_time: Option<DateTime<Utc>>,
    base_url: String,
}

impl Image {
    /// Creates an image located at `base_url`, the image's REST resource path
    /// relative to the platform API root.
    pub fn new(id: MediaID, name: &str, dimensions: Dimensions, base_url: &str) -> Self {
        Image {
            id,
            name: name.to_string(),
            dimensions,
            upload_time: None,
            base_url: base_url.to_string(),
        }
    }

    pub fn id(&self) -> &MediaID {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn upload_time(&self) -> Option<DateTime<Utc>> {
        self.upload_time
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// A video in a dataset. Videos are annotated frame by frame, see
/// [`Video::frames`].
#[derive(Clone, Debug, PartialEq)]
pub struct Video {
    id: MediaID,
    name: String,
    dimensions: Dimensions,
    frame_count: u64,
    frame_stride: u64,
    frame_rate: Option<f64>,
    duration: Option<f64>,
    base_url: String,
}

impl Video {
    pub fn new(
        id: MediaID,
        name: &str,
        dimensions: Dimensions,
        frame_count: u64,
        frame_stride: u64,
        base_url: &str,
    ) -> Self {
        Video {
            id,
            name: name.to_string(),
            dimensions,
            frame_count,
            frame_stride,
            frame_rate: None,
            duration: None,
            base_url: base_url.to_string(),
        }
    }

    pub fn id(&self) -> &MediaID {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn frame_stride(&self) -> u64 {
        self.frame_stride
    }

    pub fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the frame at `frame_index`, named `{video}_frame_{index}`.
    pub fn frame(&self, frame_index: u64) -> VideoFrame {
        VideoFrame {
            video_id: self.id.clone(),
            video_name: Some(self.name.clone()),
            name: format!("{}_frame_{}", file_stem(&self.name), frame_index),
            dimensions: self.dimensions,
            frame_index,
            base_url: format!("{}/frames/{}", self.base_url, frame_index),
        }
    }

    /// Returns every `frame_stride`-th frame of the video.
    pub fn frames(&self) -> Vec<VideoFrame> {
        let stride = self.frame_stride.max(1) as usize;
        (0..self.frame_count)
            .step_by(stride)
            .map(|index| self.frame(index))
            .collect()
    }
}

/// A single frame of a video, annotatable like an image.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    video_id: MediaID,
    video_name: Option<String>,
    name: String,
    dimensions: Dimensions,
    frame_index: u64,
    base_url: String,
}

impl VideoFrame {
    pub fn new(
        video_id: MediaID,
        name: &str,
        frame_index: u64,
        dimensions: Dimensions,
        base_url: &str,
    ) -> Self {
        VideoFrame {
            video_id,
            video_name: None,
            name: name.to_string(),
            dimensions,
            frame_index,
            base_url: base_url.to_string(),
        }
    }

    pub fn with_video_name(mut self, video_name: Option<String>) -> Self {
        self.video_name = video_name;
        self
    }

    pub fn video_id(&self) -> &MediaID {
        &self.video_id
    }

    pub fn video_name(&self) -> Option<&str> {
        self.video_name.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// A media item on the annotation platform.
///
/// Images and video frames carry annotation scenes; videos are listed by the
/// media enumerator and expanded into frames with [`Video::frames`].
#[derive(Clone, Debug, PartialEq)]
pub enum MediaItem {
    Image(Image),
    Video(Video),
    VideoFrame(VideoFrame),
}

impl From<Image> for MediaItem {
    fn from(image: Image) -> Self {
        MediaItem::Image(image)
    }
}

impl From<Video> for MediaItem {
    fn from(video: Video) -> Self {
        MediaItem::Video(video)
    }
}

impl From<VideoFrame> for MediaItem {
    fn from(frame: VideoFrame) -> Self {
        MediaItem::VideoFrame(frame)
    }
}

impl Display for MediaItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind_name(), self.name())
    }
}

impl MediaItem {
    /// Parses one raw item from a media listing page. `collection_url` is
    /// the listing endpoint the item was returned from, without query.
    pub(crate) fn from_rest(
        value: serde_json::Value,
        kind: MediaKind,
        collection_url: &str,
    ) -> Result<MediaItem, Error> {
        let raw: MediaRaw = serde_json::from_value(value)?;

        if let Some(media_type) = &raw.media_type
            && media_type != &kind.to_string()
        {
            return Err(Error::InvalidMediaType(media_type.clone()));
        }

        let base_url = format!("{}/{}", collection_url, raw.id);
        let dimensions = Dimensions::new(raw.media_information.width, raw.media_information.height);

        let item = match kind {
            MediaKind::Image => MediaItem::Image(Image {
                id: raw.id,
                name: raw.name,
                dimensions,
                upload_time: raw
                    .upload_time
                    .as_deref()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.with_timezone(&Utc)),
                base_url,
            }),
            MediaKind::Video => MediaItem::Video(Video {
                id: raw.id,
                name: raw.name,
                dimensions,
                frame_count: raw.media_information.frame_count.unwrap_or(0),
                frame_stride: raw.media_information.frame_stride.unwrap_or(1),
                frame_rate: raw.media_information.frame_rate,
                duration: raw.media_information.duration,
                base_url,
            }),
        };

        Ok(item)
    }

    pub fn name(&self) -> &str {
        match self {
            MediaItem::Image(image) => image.name(),
            MediaItem::Video(video) => video.name(),
            MediaItem::VideoFrame(frame) => frame.name(),
        }
    }

    pub fn base_url(&self) -> &str {
        match self {
            MediaItem::Image(image) => image.base_url(),
            MediaItem::Video(video) => video.base_url(),
            MediaItem::VideoFrame(frame) => frame.base_url(),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        match self {
            MediaItem::Image(image) => image.dimensions(),
            MediaItem::Video(video) => video.dimensions(),
            MediaItem::VideoFrame(frame) => frame.dimensions(),
        }
    }

    /// Base of the item's annotation file name.
    ///
    /// Images and videos use the file stem of their name. Frame names carry
    /// no extension, so a video frame keeps its name minus any directory and
    /// `drive.day1_frame_0` stays distinct from `drive.day1_frame_1`.
    pub fn file_base(&self) -> String {
        match self {
            MediaItem::VideoFrame(frame) => base_name(frame.name()),
            _ => file_stem(self.name()),
        }
    }

    /// Human readable kind, used in log messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            MediaItem::Image(_) => "image",
            MediaItem::Video(_) => "video",
            MediaItem::VideoFrame(_) => "video frame",
        }
    }

    pub fn identifier(&self) -> MediaIdentifier {
        match self {
            MediaItem::Image(image) => MediaIdentifier::Image {
                image_id: image.id.clone(),
            },
            MediaItem::Video(video) => MediaIdentifier::Video {
                video_id: video.id.clone(),
            },
            MediaItem::VideoFrame(frame) => MediaIdentifier::VideoFrame {
                video_id: frame.video_id.clone(),
                frame_index: frame.frame_index,
            },
        }
    }

    /// True for media that carries a single annotation scene.
    pub fn is_annotatable(&self) -> bool {
        !matches!(self, MediaItem::Video(_))
    }

    /// Endpoint receiving new annotation scenes for this item.
    pub fn annotations_url(&self) -> Result<String, Error> {
        self.ensure_annotatable()?;
        Ok(format!("{}/annotations", self.base_url()))
    }

    /// Endpoint serving the latest annotation scene for this item.
    pub fn latest_annotation_url(&self) -> Result<String, Error> {
        self.ensure_annotatable()?;
        Ok(format!("{}/annotations/latest", self.base_url()))
    }

    pub(crate) fn ensure_annotatable(&self) -> Result<(), Error> {
        if self.is_annotatable() {
            Ok(())
        } else {
            Err(Error::UnsupportedMediaType(format!(
                "{} '{}' is annotated per frame, not as a single scene",
                self.kind_name(),
                self.name()
            )))
        }
    }
}

/// File name without directory.
pub(crate) fn base_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|base| base.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

/// File name without directory and extension.
pub(crate) fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}
