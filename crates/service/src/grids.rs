use std::sync::Arc;

use anyhow::{Context, Result};
use async_std::{fs, path::Path};
use pf_geom::{Field, Footprint};
use pf_grid::{decode_grids, encode_grids, DecodedGrids, FieldContext, Grid, GridTree};
use tracing::{debug, info, warn};

/// Loads persisted grids and the robot footprint.
///
/// A missing or invalid file is replaced by an empty set of grids with the
/// default footprint. The caller is expected to store the grids afterwards.
pub(crate) async fn load_grids(path: &Path, field: &Field) -> DecodedGrids {
    match try_load_grids(path, field).await {
        Ok(Some(grids)) => return grids,
        Ok(None) => info!(
            "Grids file does not exist, starting without obstacles: {}",
            path.to_string_lossy()
        ),
        Err(err) => warn!(
            "Invalid grids file {}, starting without obstacles: {:?}",
            path.to_string_lossy(),
            err
        ),
    }

    DecodedGrids {
        context: Arc::new(FieldContext::new(*field, Footprint::default())),
        grids: Vec::new(),
    }
}

async fn try_load_grids(path: &Path, field: &Field) -> Result<Option<DecodedGrids>> {
    if !path.is_file().await {
        return Ok(None);
    }

    info!("Loading grids from {}", path.to_string_lossy());
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("Could not read grids file: {}", path.to_string_lossy()))?;
    decode_grids(text.as_str(), field)
        .map(Some)
        .context("Failed to decode grids")
}

/// Stores top-level grids of the tree together with the robot footprint.
pub(crate) async fn store_grids(path: &Path, tree: &GridTree) -> Result<()> {
    debug!(
        "Storing {} grids to {}",
        tree.root().children().len(),
        path.to_string_lossy()
    );
    let text = encode_grids(tree.context().footprint(), tree.root().children())
        .context("Failed to serialize grids")?;
    fs::write(path, text).await.with_context(|| {
        format!(
            "Failed to write grids file: {}",
            path.to_string_lossy()
        )
    })
}

#[cfg(test)]
mod tests {
    use async_std::{path::PathBuf, task};
    use pf_geom::ObjectId;
    use pf_grid::GridType;

    use super::*;

    fn field() -> Field {
        Field::new(1., 4., 4., 0., 0.)
    }

    #[test]
    fn test_missing_and_invalid() {
        let tmp_dir = tempfile::Builder::new()
            .prefix("pf_service_")
            .tempdir()
            .unwrap();
        let path: PathBuf = tmp_dir.path().join("grids.json").into();

        let grids = task::block_on(load_grids(&path, &field()));
        assert!(grids.grids.is_empty());
        assert_eq!(grids.context.field(), &field());

        std::fs::write(tmp_dir.path().join("grids.json"), "{\"robot\": 1").unwrap();
        let grids = task::block_on(load_grids(&path, &field()));
        assert!(grids.grids.is_empty());
    }

    #[test]
    fn test_store_and_load() {
        let tmp_dir = tempfile::Builder::new()
            .prefix("pf_service_")
            .tempdir()
            .unwrap();
        let path: PathBuf = tmp_dir.path().join("grids.json").into();

        let context = Arc::new(FieldContext::new(field(), Footprint::default()));
        let root = ObjectId::from_u128(1);
        let mut tree = GridTree::new(root, Arc::clone(&context));
        tree.add_grid(root, ObjectId::from_u128(2), GridType::Bitfield)
            .unwrap();
        tree.set_cell(ObjectId::from_u128(2), 1, 2, false).unwrap();
        task::block_on(store_grids(&path, &tree)).unwrap();

        let grids = task::block_on(load_grids(&path, &field()));
        assert_eq!(grids.context.footprint(), context.footprint());
        assert_eq!(grids.grids.len(), 1);
        let grid = &grids.grids[0];
        assert_eq!(grid.id(), ObjectId::from_u128(2));
        assert!(!grid.can_cell_pass(1, 2));
        assert!(grid.can_cell_pass(2, 1));
    }
}
