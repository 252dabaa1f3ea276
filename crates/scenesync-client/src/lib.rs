// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! # SceneSync Client Library
//!
//! The SceneSync Client Library synchronizes annotation scenes between local
//! annotation sources and a computer-vision annotation platform over its REST
//! API.
//!
//! ## Features
//!
//! - **Label Mapping**: Translate local label names to the label ids of a
//!   platform project, failing early on labels the project does not define
//! - **Media Enumeration**: List the images and videos of a dataset across
//!   paginated responses
//! - **Annotation Upload**: Replace or append to the annotations of images
//!   and video frames
//! - **Annotation Download**: Save the latest annotations of many media items
//!   to disk with collision-free file names
//! - **Version Compatibility**: Exchange normalized coordinates with legacy
//!   platforms and pixel coordinates with current ones
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scenesync_client::{AnnotationClient, ClientConfig, Error, HttpTransport, MediaKind};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let config = ClientConfig::load()?;
//!     let transport = Arc::new(HttpTransport::new(&config)?);
//!
//!     let client = AnnotationClient::connect(
//!         transport,
//!         "6536a1c2d1b7f0e1a2b3c4d5".parse()?,
//!         &"6536a1c2d1b7f0e1a2b3c4d6".parse()?,
//!     )
//!     .await?;
//!
//!     let images = client.all_media(MediaKind::Image).await?;
//!     let elapsed = client
//!         .download_annotations(&images, "./export", false, None)
//!         .await?;
//!     println!("Downloaded annotations in {:.1}s", elapsed);
//!
//!     Ok(())
//! }
//! ```

mod api;
mod client;
mod config;
mod convert;
mod download;
mod error;
mod labels;
mod media;
mod reader;
mod retry;
mod scene;
mod transport;

pub use crate::{
    api::{
        Dataset, DatasetID, Label, LabelID, MediaID, PlatformVersion, Project, ProjectID, Task,
        WorkspaceID,
    },
    client::{AnnotationClient, MEDIA_PAGE_SIZE, Progress, platform_version},
    config::ClientConfig,
    convert::{GenericConverter, NormalizedConverter, SceneConverter, converter_for},
    download::derive_filename,
    error::Error,
    labels::LabelMapping,
    media::{Dimensions, Image, MediaIdentifier, MediaItem, MediaKind, Video, VideoFrame},
    reader::{AnnotationReader, SceneFileReader},
    retry::{RetryScope, classify_url},
    scene::{Annotation, AnnotationKind, AnnotationScene, Point, ScoredLabel, Shape},
    transport::{HttpTransport, Transport},
};
