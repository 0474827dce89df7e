//! OME-Zarr overlay metadata.
//!
//! Serde models for the `multiscales`, `plate`, `well`, `image-label` and
//! `labels` objects found in OME-Zarr group attributes.
//!
//! See <https://ngff.openmicroscopy.org/0.4/>.

use serde::{Deserialize, Serialize};

use crate::coordinate::CoordinateTransform;

/// An axis of a multiscale image.
///
/// Very old overlays declare axes as plain strings; both forms are accepted.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub struct Axis {
    /// The axis name (e.g. `t`, `c`, `z`, `y`, `x`).
    pub name: String,
    /// The axis type (e.g. `time`, `channel`, `space`).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<String>,
    /// The physical unit of the axis (e.g. `micrometer`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl<'de> serde::Deserialize<'de> for Axis {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct AxisObject {
            name: String,
            #[serde(default, rename = "type")]
            axis_type: Option<String>,
            #[serde(default)]
            unit: Option<String>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum AxisIntermediate {
            Name(String),
            Object(AxisObject),
        }

        match AxisIntermediate::deserialize(d)? {
            AxisIntermediate::Name(name) => Ok(Self {
                name,
                axis_type: None,
                unit: None,
            }),
            AxisIntermediate::Object(axis) => Ok(Self {
                name: axis.name,
                axis_type: axis.axis_type,
                unit: axis.unit,
            }),
        }
    }
}

impl Axis {
    /// Create a named axis with no type or unit.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            axis_type: None,
            unit: None,
        }
    }
}

/// A resolution dataset of a multiscale image.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct MultiscaleDataset {
    /// The path of the dataset's array, relative to the image group.
    pub path: String,
    /// The dataset-level coordinate transforms.
    #[serde(default, rename = "coordinateTransformations")]
    pub coordinate_transformations: Vec<CoordinateTransform>,
}

/// A `multiscales` list entry: one multiscale image.
///
/// Datasets are ordered highest resolution first.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct MultiscaleMetadata {
    /// The overlay version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// The image name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The axis list. Absent in overlays predating the axes field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axes: Option<Vec<Axis>>,
    /// The resolution datasets, ordered highest resolution first.
    pub datasets: Vec<MultiscaleDataset>,
    /// The multiscale-level coordinate transforms, applied after the
    /// dataset-level transforms.
    #[serde(default, rename = "coordinateTransformations")]
    pub coordinate_transformations: Vec<CoordinateTransform>,
}

/// A row or column descriptor of a plate.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct PlateRowColumn {
    /// The row or column name.
    pub name: String,
}

/// A well entry of a plate.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct PlateWell {
    /// The path of the well group, relative to the plate group.
    pub path: String,
    /// The index into the plate's rows list.
    #[serde(default, rename = "rowIndex")]
    pub row_index: Option<usize>,
    /// The index into the plate's columns list.
    #[serde(default, rename = "columnIndex")]
    pub column_index: Option<usize>,
}

/// An acquisition of a plate.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct PlateAcquisition {
    /// The acquisition identifier.
    pub id: u64,
    /// The acquisition name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The `plate` object of a high-content-screening plate group.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct PlateMetadata {
    /// The overlay version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// The plate name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The plate rows.
    #[serde(default)]
    pub rows: Vec<PlateRowColumn>,
    /// The plate columns.
    #[serde(default)]
    pub columns: Vec<PlateRowColumn>,
    /// The wells of the plate.
    pub wells: Vec<PlateWell>,
    /// The acquisitions of the plate.
    #[serde(default)]
    pub acquisitions: Vec<PlateAcquisition>,
    /// The maximum number of fields per well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_count: Option<u64>,
}

/// An image (field of view) entry of a well.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct WellImage {
    /// The path of the field group, relative to the well group.
    pub path: String,
    /// The acquisition id of the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquisition: Option<u64>,
}

/// The `well` object of a well group.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct WellMetadata {
    /// The overlay version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// The fields of view of the well.
    pub images: Vec<WellImage>,
}

/// The `image-label` object of a label image.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ImageLabelMetadata {
    /// The overlay version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// The label colors.
    #[serde(default)]
    pub colors: Vec<serde_json::Value>,
    /// The label properties.
    #[serde(default)]
    pub properties: Vec<serde_json::Value>,
    /// The source image of the labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_forms() {
        let axes: Vec<Axis> = serde_json::from_str(
            r#"[{"name": "z", "type": "space", "unit": "micrometer"}, {"name": "y", "type": "space"}]"#,
        )
        .unwrap();
        assert_eq!(axes[0].name, "z");
        assert_eq!(axes[0].unit.as_deref(), Some("micrometer"));

        let axes: Vec<Axis> = serde_json::from_str(r#"["z", "y", "x"]"#).unwrap();
        assert_eq!(axes.len(), 3);
        assert_eq!(axes[2].name, "x");
        assert_eq!(axes[2].axis_type, None);
    }

    #[test]
    fn multiscale_metadata() {
        let json = r#"{
            "version": "0.4",
            "axes": [
                {"name": "y", "type": "space", "unit": "micrometer"},
                {"name": "x", "type": "space", "unit": "micrometer"}
            ],
            "datasets": [
                {
                    "path": "0",
                    "coordinateTransformations": [{"type": "scale", "scale": [0.5, 0.5]}]
                },
                {
                    "path": "1",
                    "coordinateTransformations": [{"type": "scale", "scale": [1.0, 1.0]}]
                }
            ],
            "coordinateTransformations": [{"type": "translation", "translation": [10.0, 20.0]}]
        }"#;
        let metadata: MultiscaleMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.datasets.len(), 2);
        assert_eq!(metadata.datasets[0].path, "0");
        assert_eq!(metadata.coordinate_transformations.len(), 1);
    }

    #[test]
    fn plate_metadata() {
        let json = r#"{
            "rows": [{"name": "A"}, {"name": "B"}],
            "columns": [{"name": "1"}, {"name": "2"}],
            "wells": [
                {"path": "A/1", "rowIndex": 0, "columnIndex": 0},
                {"path": "B/2", "rowIndex": 1, "columnIndex": 1}
            ],
            "field_count": 2
        }"#;
        let metadata: PlateMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.rows.len(), 2);
        assert_eq!(metadata.wells[1].path, "B/2");
        assert_eq!(metadata.field_count, Some(2));
    }
}
