// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    Error,
    api::{LabelID, Project},
};
use std::collections::HashMap;

/// Translation table from label names, as used by local annotation sources,
/// to the label ids the platform assigned in a project.
///
/// # Examples
///
/// ```rust
/// use scenesync_client::{Label, LabelMapping, Project, Task};
///
/// let project = Project::new(
///     "p1".try_into().unwrap(),
///     "Animals",
///     vec![Task::new(
///         "detection",
///         vec![
///             Label::new("l1".try_into().unwrap(), "cat"),
///             Label::new("l2".try_into().unwrap(), "dog"),
///         ],
///     )],
///     vec![],
/// );
///
/// let mapping = LabelMapping::resolve(&project, &["cat".to_string()]).unwrap();
/// assert_eq!(mapping.id("dog").unwrap().value(), "l2");
/// assert!(LabelMapping::resolve(&project, &["bird".to_string()]).is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelMapping {
    name_to_id: HashMap<String, LabelID>,
}

impl LabelMapping {
    /// Builds the name to id mapping of `project` and verifies that every
    /// name in `source_label_names` is part of it.
    ///
    /// Fails with [`Error::UnmappedLabel`] naming the first source label the
    /// project does not define. When two project labels share a name, the
    /// later one in pipeline order wins.
    pub fn resolve(project: &Project, source_label_names: &[String]) -> Result<Self, Error> {
        let name_to_id: HashMap<String, LabelID> = project
            .label_id_to_name()
            .into_iter()
            .map(|(id, name)| (name, id))
            .collect();

        if let Some(missing) = source_label_names
            .iter()
            .find(|name| !name_to_id.contains_key(name.as_str()))
        {
            return Err(Error::UnmappedLabel(missing.clone()));
        }

        Ok(LabelMapping { name_to_id })
    }

    /// Platform id of the label called `name`.
    pub fn id(&self, name: &str) -> Option<&LabelID> {
        self.name_to_id.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_to_id.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.name_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabelID)> {
        self.name_to_id
            .iter()
            .map(|(name, id)| (name.as_str(), id))
    }
}
