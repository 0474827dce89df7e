//! Label (segmentation mask) groups.

use crate::{group::Group, storage::AsyncReadableStorageTraits};

use super::{image::MultiscaleImage, NodeError};

/// A group of label images (segmentation masks), listed by its `labels`
/// attribute.
#[derive(Debug, Clone)]
pub struct LabelGroup<TStorage: ?Sized> {
    group: Group<TStorage>,
    labels: Vec<String>,
}

impl<TStorage: ?Sized> LabelGroup<TStorage> {
    /// Create a label group over `group` from the `labels` list in its
    /// attributes.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if the group has no valid `labels` attribute.
    pub fn new(group: Group<TStorage>) -> Result<Self, NodeError> {
        let labels = group
            .attributes()
            .get("labels")
            .ok_or_else(|| NodeError::InvalidOverlay("missing labels".to_string()))?;
        let labels: Vec<String> = serde_json::from_value(labels.clone())
            .map_err(|err| NodeError::InvalidOverlay(err.to_string()))?;
        Ok(Self { group, labels })
    }

    /// The names of the labels in the group.
    #[must_use]
    pub fn label_names(&self) -> &[String] {
        &self.labels
    }
}

impl<TStorage: ?Sized + AsyncReadableStorageTraits> LabelGroup<TStorage> {
    /// Open the label image named `name` as a multiscale image.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if `name` is not a label of the group or its
    /// image cannot be opened.
    pub async fn label(&self, name: &str) -> Result<MultiscaleImage<TStorage>, NodeError> {
        if !self.labels.iter().any(|label| label == name) {
            return Err(NodeError::InvalidOverlay(format!(
                "the group has no label named {name}"
            )));
        }
        let group = self.group.child_group(name).await?;
        MultiscaleImage::new(group)
    }
}
