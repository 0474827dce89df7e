use std::sync::Arc;

use omezarr::array::{Array, DataType};
use omezarr::array_subset::ArraySubset;
use omezarr::group::Group;
use omezarr::node::Node;
use omezarr::storage::{store::MemoryStore, AsyncWritableStorageTraits, StoreKey};

async fn set_json(
    store: &MemoryStore,
    key: &str,
    json: &serde_json::Value,
) -> Result<(), Box<dyn std::error::Error>> {
    store
        .set(&StoreKey::new(key)?, serde_json::to_vec(json)?.into())
        .await?;
    Ok(())
}

fn zarray_v2(separator: Option<&str>) -> serde_json::Value {
    let mut zarray = serde_json::json!({
        "zarr_format": 2,
        "shape": [4, 4],
        "chunks": [2, 2],
        "dtype": "|u1",
        "compressor": null,
        "fill_value": 0,
        "order": "C"
    });
    if let Some(separator) = separator {
        zarray["dimension_separator"] = separator.into();
    }
    zarray
}

#[tokio::test]
async fn v2_array_with_declared_separator() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    set_json(&store, "a/.zarray", &zarray_v2(Some("/"))).await?;
    store
        .set(&StoreKey::new("a/0/0")?, vec![0u8, 1, 4, 5].into())
        .await?;

    let array = Array::open(store, "/a").await?;
    assert_eq!(array.data_type(), DataType::UInt8);
    assert_eq!(
        array
            .retrieve_region(&ArraySubset::new_with_ranges(&[0..2, 0..2]), 1)
            .await?,
        vec![0u8, 1, 4, 5]
    );
    Ok(())
}

#[tokio::test]
async fn v2_separator_probe() -> Result<(), Box<dyn std::error::Error>> {
    // Undeclared separator with a chunk at 0/0: the probe selects '/'.
    let store = Arc::new(MemoryStore::new());
    set_json(&store, "a/.zarray", &zarray_v2(None)).await?;
    store
        .set(&StoreKey::new("a/0/0")?, vec![1u8, 2, 3, 4].into())
        .await?;
    let array = Array::open(store, "/a").await?;
    assert_eq!(
        array
            .retrieve_region(&ArraySubset::new_with_ranges(&[0..2, 0..2]), 1)
            .await?,
        vec![1u8, 2, 3, 4]
    );

    // Undeclared separator with a chunk at 0.0: the probe falls back to '.'.
    let store = Arc::new(MemoryStore::new());
    set_json(&store, "a/.zarray", &zarray_v2(None)).await?;
    store
        .set(&StoreKey::new("a/0.1")?, vec![5u8, 6, 7, 8].into())
        .await?;
    let array = Array::open(store, "/a").await?;
    assert_eq!(
        array
            .retrieve_region(&ArraySubset::new_with_ranges(&[0..2, 2..4]), 1)
            .await?,
        vec![5u8, 6, 7, 8]
    );

    // Neither chunk present: '.' is used and reads return fill.
    let store = Arc::new(MemoryStore::new());
    set_json(&store, "a/.zarray", &zarray_v2(None)).await?;
    let array = Array::open(store, "/a").await?;
    assert_eq!(
        array
            .retrieve_region(&ArraySubset::new_with_ranges(&[0..4, 0..4]), 1)
            .await?,
        vec![0u8; 16]
    );
    Ok(())
}

#[tokio::test]
async fn v2_array_with_attributes_and_compressor() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let mut zarray = zarray_v2(Some("."));
    zarray["dtype"] = ">u2".into();
    zarray["compressor"] =
        serde_json::json!({"id": "blosc", "cname": "lz4", "clevel": 5, "shuffle": 1, "blocksize": 0});
    set_json(&store, "b/.zarray", &zarray).await?;
    set_json(&store, "b/.zattrs", &serde_json::json!({"kind": "test"})).await?;

    let array = Array::open(store.clone(), "/b").await?;
    assert_eq!(array.data_type(), DataType::UInt16);
    assert_eq!(array.attributes().get("kind").unwrap(), "test");

    // Round-trip through the v2 blosc + big-endian chain.
    let elements: Vec<u16> = (0..16).collect();
    let region = ArraySubset::new_with_ranges(&[0..4, 0..4]);
    array.store_region_elements(&region, elements.clone()).await?;
    assert_eq!(
        array.retrieve_region_elements::<u16>(&region, 1).await?,
        elements
    );
    // Chunk keys use the '.' separator with no c/ prefix.
    let chunk = omezarr::storage::AsyncReadableStorageTraits::get(
        &*store,
        &StoreKey::new("b/0.0")?,
    )
    .await?
    .expect("chunk 0.0 exists");
    // The blosc frame header declares typesize 2 from the dtype.
    assert_eq!(chunk[3], 2);
    Ok(())
}

#[tokio::test]
async fn group_probing() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    set_json(
        &store,
        "zarr.json",
        &serde_json::json!({"zarr_format": 3, "node_type": "group", "attributes": {"name": "root"}}),
    )
    .await?;
    set_json(&store, "old/.zgroup", &serde_json::json!({"zarr_format": 2})).await?;
    set_json(&store, "old/.zattrs", &serde_json::json!({"era": "v2"})).await?;

    let root = Group::open(store.clone(), "/").await?;
    assert_eq!(root.attributes().get("name").unwrap(), "root");

    let old = root.child_group("old").await?;
    assert_eq!(old.attributes().get("era").unwrap(), "v2");

    assert!(root.has_child("old").await?);
    assert!(!root.has_child("new").await?);
    assert!(Group::open(store, "/missing").await.is_err());
    Ok(())
}

/// Build a two-level multiscale image on a memory store.
async fn build_image(store: &Arc<MemoryStore>) -> Result<(), Box<dyn std::error::Error>> {
    set_json(
        store,
        "zarr.json",
        &serde_json::json!({
            "zarr_format": 3,
            "node_type": "group",
            "attributes": {
                "multiscales": [{
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
                    "coordinateTransformations": [
                        {"type": "translation", "translation": [10.0, 20.0]}
                    ]
                }]
            }
        }),
    )
    .await?;

    for (path, shape, chunks) in [("0", 8u64, 4u64), ("1", 4, 4)] {
        let array = omezarr::array::ArrayBuilder::new(
            vec![shape, shape],
            DataType::UInt8,
            vec![chunks, chunks],
        )
        .build(store.clone(), &format!("/{path}"))?;
        array.store_metadata().await?;
        let bytes: Vec<u8> = (0..shape * shape).map(|i| u8::try_from(i % 256).unwrap()).collect();
        array
            .store_region(
                &ArraySubset::new_with_ranges(&[0..shape, 0..shape]),
                &bytes,
            )
            .await?;
    }
    Ok(())
}

#[tokio::test]
async fn multiscale_image_physical_read() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    build_image(&store).await?;

    let node = Node::open(store, "/").await?;
    let image = node.as_image().expect("root is a multiscale image");
    assert_eq!(image.num_levels(), 2);
    let axes = image.axes_for_rank(2)?;
    assert_eq!(axes[0].name, "y");
    assert_eq!(axes[1].unit.as_deref(), Some("micrometer"));

    // Level 0: physical = 0.5 * index + (10, 20).
    let level = image.level(0).await?;
    assert_eq!(level.array.shape(), &[8, 8]);
    assert_eq!(level.mapping.scale(), &[0.5, 0.5]);
    assert_eq!(level.mapping.translation(), &[10.0, 20.0]);

    // The physical box [10, 20] + [2, 1] maps to pixels y 0..4, x 0..2.
    let bytes = image
        .read_physical_region(0, &[10.0, 20.0], &[2.0, 1.0])
        .await?;
    let expected: Vec<u8> = (0..4u8)
        .flat_map(|y| (0..2u8).map(move |x| y * 8 + x))
        .collect();
    assert_eq!(bytes, expected);

    // Level 1 is a quarter of the resolution.
    let level = image.level(1).await?;
    assert_eq!(level.array.shape(), &[4, 4]);
    assert_eq!(level.mapping.scale(), &[1.0, 1.0]);
    Ok(())
}

#[tokio::test]
async fn plate_well_field_navigation() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    set_json(
        &store,
        "zarr.json",
        &serde_json::json!({
            "zarr_format": 3,
            "node_type": "group",
            "attributes": {
                "plate": {
                    "rows": [{"name": "A"}],
                    "columns": [{"name": "1"}],
                    "wells": [{"path": "A/1", "rowIndex": 0, "columnIndex": 0}],
                    "field_count": 1
                }
            }
        }),
    )
    .await?;
    set_json(
        &store,
        "A/1/zarr.json",
        &serde_json::json!({
            "zarr_format": 3,
            "node_type": "group",
            "attributes": {"well": {"images": [{"path": "0", "acquisition": 0}]}}
        }),
    )
    .await?;
    set_json(
        &store,
        "A/1/0/zarr.json",
        &serde_json::json!({
            "zarr_format": 3,
            "node_type": "group",
            "attributes": {
                "multiscales": [{
                    "axes": ["y", "x"],
                    "datasets": [{"path": "0", "coordinateTransformations": [{"type": "identity"}]}]
                }]
            }
        }),
    )
    .await?;
    let field = omezarr::array::ArrayBuilder::new(vec![2, 2], DataType::UInt8, vec![2, 2])
        .build(store.clone(), "/A/1/0/0")?;
    field.store_metadata().await?;
    field.store_chunk(&[0, 0], vec![1, 2, 3, 4]).await?;

    let node = Node::open(store, "/").await?;
    let plate = node.as_plate().expect("root is a plate");
    assert_eq!(plate.well_paths(), vec!["A/1"]);

    let well = plate.well_at("A", "1").await?;
    assert_eq!(well.num_fields(), 1);
    assert!(plate.well("B/1").await.is_err());

    let image = well.field(0).await?;
    let level = image.level(0).await?;
    assert_eq!(
        level
            .array
            .retrieve_region(&ArraySubset::new_with_ranges(&[0..2, 0..2]), 1)
            .await?,
        vec![1, 2, 3, 4]
    );
    Ok(())
}

#[tokio::test]
async fn labels_and_unknown_and_collection() -> Result<(), Box<dyn std::error::Error>> {
    // A labels group.
    let store = Arc::new(MemoryStore::new());
    set_json(
        &store,
        "zarr.json",
        &serde_json::json!({
            "zarr_format": 3,
            "node_type": "group",
            "attributes": {"labels": ["cells"]}
        }),
    )
    .await?;
    let node = Node::open(store, "/").await?;
    let Node::Labels(labels) = node else {
        panic!("expected a label group");
    };
    assert_eq!(labels.label_names(), ["cells".to_string()]);

    // An unrecognised overlay classifies as Unknown, not an error.
    let store = Arc::new(MemoryStore::new());
    set_json(
        &store,
        "zarr.json",
        &serde_json::json!({
            "zarr_format": 3,
            "node_type": "group",
            "attributes": {"bioformats2raw.layout": 3}
        }),
    )
    .await?;
    let node = Node::open(store.clone(), "/").await?;
    let Node::Unknown(group) = node else {
        panic!("expected an unknown node");
    };
    assert!(group.attributes().contains_key("bioformats2raw.layout"));

    // With numbered children it discovers a collection instead.
    let store = Arc::new(MemoryStore::new());
    set_json(
        &store,
        "zarr.json",
        &serde_json::json!({"zarr_format": 3, "node_type": "group"}),
    )
    .await?;
    set_json(
        &store,
        "0/zarr.json",
        &serde_json::json!({
            "zarr_format": 3,
            "node_type": "group",
            "attributes": {
                "multiscales": [{
                    "axes": ["y", "x"],
                    "datasets": [{"path": "0", "coordinateTransformations": [{"type": "identity"}]}]
                }]
            }
        }),
    )
    .await?;
    let array = omezarr::array::ArrayBuilder::new(vec![2, 2], DataType::UInt8, vec![2, 2])
        .build(store.clone(), "/0/0")?;
    array.store_metadata().await?;

    let node = Node::open(store, "/").await?;
    let Node::Collection(collection) = node else {
        panic!("expected a collection");
    };
    assert_eq!(collection.num_series(), 1);
    assert!(matches!(collection.series(0).await?, Node::Image(_)));
    assert!(collection.series(1).await.is_err());
    Ok(())
}

#[tokio::test]
async fn reader_entry_point() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::TempDir::new()?;
    let store = Arc::new(omezarr::storage::store::FilesystemStore::new(dir.path())?);
    set_json_fs(
        &store,
        "zarr.json",
        &serde_json::json!({
            "zarr_format": 3,
            "node_type": "group",
            "attributes": {
                "multiscales": [{
                    "axes": ["y", "x"],
                    "datasets": [{"path": "0", "coordinateTransformations": [{"type": "identity"}]}]
                }]
            }
        }),
    )
    .await?;
    let array = omezarr::array::ArrayBuilder::new(vec![2, 2], DataType::UInt8, vec![2, 2])
        .build(store.clone(), "/0")?;
    array.store_metadata().await?;
    array.store_chunk(&[0, 0], vec![7, 8, 9, 10]).await?;

    let reader = omezarr::reader::open(dir.path().to_str().unwrap())?;
    let node = reader.root().await?;
    let image = node.as_image().expect("root is a multiscale image");
    let bytes = image
        .read_physical_region(0, &[0.0, 0.0], &[2.0, 2.0])
        .await?;
    assert_eq!(bytes, vec![7, 8, 9, 10]);
    Ok(())
}

async fn set_json_fs(
    store: &omezarr::storage::store::FilesystemStore,
    key: &str,
    json: &serde_json::Value,
) -> Result<(), Box<dyn std::error::Error>> {
    store
        .set(&StoreKey::new(key)?, serde_json::to_vec(json)?.into())
        .await?;
    Ok(())
}
