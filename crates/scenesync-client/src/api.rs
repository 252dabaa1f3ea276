// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt::Display, str::FromStr};

/// Declares a string-backed identifier for platform entities.
///
/// Platform identifiers are opaque strings (usually hex object ids). Parsing
/// from a string rejects empty values and values containing whitespace;
/// deserialization from server responses is transparent.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(String);

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl $name {
            pub fn value(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(val: $name) -> Self {
                val.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                if s.is_empty() || s.chars().any(char::is_whitespace) {
                    return Err(Error::InvalidParameters(format!(
                        "{} must be a non-empty identifier without whitespace: '{}'",
                        stringify!($name),
                        s
                    )));
                }
                Ok($name(s.to_string()))
            }
        }

        impl TryFrom<&str> for $name {
            type Error = Error;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                $name::from_str(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                $name::from_str(&s)
            }
        }
    };
}

string_id!(
    /// Identifier of a workspace on the annotation platform.
    WorkspaceID
);

string_id!(
    /// Identifier of a project within a workspace.
    ///
    /// ```rust
    /// use scenesync_client::ProjectID;
    ///
    /// let project_id: ProjectID = "6335a5d3e6ab4c1e8e3b7f01".try_into().unwrap();
    /// assert_eq!(project_id.value(), "6335a5d3e6ab4c1e8e3b7f01");
    /// assert!(ProjectID::try_from("").is_err());
    /// ```
    ProjectID
);

string_id!(
    /// Identifier of a dataset within a project.
    DatasetID
);

string_id!(
    /// Identifier of an image or video.
    MediaID
);

string_id!(
    /// Identifier the platform assigns to a project label.
    LabelID
);

/// A label from the project's label taxonomy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Label {
    id: LabelID,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    #[serde(default)]
    is_empty: bool,
}

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}

impl Label {
    pub fn new(id: LabelID, name: &str) -> Self {
        Label {
            id,
            name: name.to_string(),
            color: None,
            group: None,
            is_empty: false,
        }
    }

    pub fn id(&self) -> &LabelID {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// True for the "no object" label the platform adds to some tasks.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }
}

/// A task in the project pipeline. Only trainable tasks carry labels.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Task {
    #[serde(default)]
    title: Option<String>,
    task_type: String,
    #[serde(default)]
    labels: Vec<Label>,
}

impl Task {
    pub fn new(task_type: &str, labels: Vec<Label>) -> Self {
        Task {
            title: None,
            task_type: task_type.to_string(),
            labels,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Labels of classification tasks apply to the full media item.
    pub fn is_global(&self) -> bool {
        self.task_type == "classification"
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
struct Pipeline {
    #[serde(default)]
    tasks: Vec<Task>,
}

/// A dataset is a partition of the project's media.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Dataset {
    id: DatasetID,
    name: String,
}

impl Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}

impl Dataset {
    pub fn new(id: DatasetID, name: &str) -> Self {
        Dataset {
            id,
            name: name.to_string(),
        }
    }

    pub fn id(&self) -> &DatasetID {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Project information as returned by the platform.
///
/// The label taxonomy is gathered from the tasks of the project pipeline in
/// pipeline order. The project is treated as immutable for the lifetime of
/// an [`AnnotationClient`](crate::AnnotationClient).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Project {
    id: ProjectID,
    name: String,
    #[serde(default)]
    pipeline: Pipeline,
    #[serde(default)]
    datasets: Vec<Dataset>,
}

impl Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}

impl Project {
    pub fn new(id: ProjectID, name: &str, tasks: Vec<Task>, datasets: Vec<Dataset>) -> Self {
        Project {
            id,
            name: name.to_string(),
            pipeline: Pipeline { tasks },
            datasets,
        }
    }

    pub fn id(&self) -> &ProjectID {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tasks(&self) -> &[Task] {
        &self.pipeline.tasks
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    /// All labels of the project, in pipeline order, without duplicates.
    pub fn labels(&self) -> Vec<&Label> {
        let mut seen = HashSet::new();
        self.pipeline
            .tasks
            .iter()
            .flat_map(|task| task.labels.iter())
            .filter(|label| seen.insert(label.id.clone()))
            .collect()
    }

    /// Ordered mapping of label id to label name.
    pub fn label_id_to_name(&self) -> Vec<(LabelID, String)> {
        self.labels()
            .into_iter()
            .map(|label| (label.id.clone(), label.name.clone()))
            .collect()
    }

    /// Names of labels that apply to a whole media item rather than a region:
    /// labels of classification tasks and empty labels.
    pub fn global_label_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for task in &self.pipeline.tasks {
            for label in &task.labels {
                if (task.is_global() || label.is_empty) && !names.contains(&label.name) {
                    names.push(label.name.clone());
                }
            }
        }
        names
    }
}

/// Version of the annotation platform, as reported by its product info
/// endpoint, e.g. `1.8.0-release-20231110`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformVersion {
    major: u32,
    minor: u32,
    patch: u32,
    build: Option<String>,
}

impl PlatformVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        PlatformVersion {
            major,
            minor,
            patch,
            build: None,
        }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }

    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }

    /// Platforms before 1.2 exchange annotations in normalized coordinates.
    pub fn is_legacy(&self) -> bool {
        (self.major, self.minor) < (1, 2)
    }
}

impl Display for PlatformVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(build) = &self.build {
            write!(f, "-{}", build)?;
        }
        Ok(())
    }
}

impl FromStr for PlatformVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (numbers, build) = match s.split_once('-') {
            Some((numbers, build)) => (numbers, Some(build.to_string())),
            None => (s, None),
        };

        let parts = numbers
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidVersion(s.to_string()))?;

        match parts.as_slice() {
            [major, minor] => Ok(PlatformVersion {
                major: *major,
                minor: *minor,
                patch: 0,
                build,
            }),
            [major, minor, patch, ..] => Ok(PlatformVersion {
                major: *major,
                minor: *minor,
                patch: *patch,
                build,
            }),
            _ => Err(Error::InvalidVersion(s.to_string())),
        }
    }
}

/// Response of the platform's `product_info` endpoint.
#[derive(Deserialize, Debug)]
pub(crate) struct ProductInfo {
    #[serde(rename = "product-version")]
    pub(crate) product_version: String,
    #[serde(rename = "build-version", default)]
    pub(crate) build_version: Option<String>,
}
