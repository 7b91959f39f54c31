use async_std::path::PathBuf;
use pf_conf::Configuration;
use pf_geom::{Field, ObjectId, Point, Shape};
use pf_grid::{Grid, GridError, GridTree, GridType};
use pf_messages::{BitfieldNet, FieldInfoNet, FromPathfinder, GridNet, ShapeNet, ToPathfinder};
use pf_pathing::{GridGraph, Pathfinder};
use tracing::{debug, error, info, warn};

use crate::grids::{load_grids, store_grids};

/// State of the pathfinder service: the grid hierarchy, the path finder and
/// the file the grids are persisted to.
///
/// All remote requests are applied through [`Self::handle`] and the path is
/// recomputed in [`Self::tick`], both from a single worker.
pub struct PathfinderTask {
    field: Field,
    grids_file: PathBuf,
    tree: GridTree,
    finder: Pathfinder,
    bias_x: f64,
    bias_y: f64,
}

impl PathfinderTask {
    /// Loads persisted grids (or starts without them) and immediately
    /// rewrites the grids file.
    ///
    /// Both the start and the goal are initially at the top left lattice
    /// point.
    pub async fn load(conf: &Configuration) -> Self {
        let field = *conf.field();
        let grids_file = PathBuf::from(conf.grids_file().to_path_buf());
        let decoded = load_grids(&grids_file, &field).await;

        let mut tree = GridTree::new(ObjectId::random(), decoded.context);
        let root = tree.root().id();
        for grid in decoded.grids {
            let id = grid.id();
            if let Err(err) = tree.insert(root, grid) {
                warn!("Persisted grid {id} dropped: {err}");
            }
        }

        let mut finder = Pathfinder::new(conf.finder());
        finder.set_start(Point::new(0, 0));
        finder.set_goal(Point::new(0, 0));

        let task = Self {
            field,
            grids_file,
            tree,
            finder,
            bias_x: conf.bias_x(),
            bias_y: conf.bias_y(),
        };
        task.save().await;
        info!(
            "Pathfinder loaded with {} grids on a {}×{} cell field",
            task.tree.root().children().len(),
            field.cells_x(),
            field.cells_y()
        );
        task
    }

    pub fn tree(&self) -> &GridTree {
        &self.tree
    }

    pub fn finder(&self) -> &Pathfinder {
        &self.finder
    }

    /// Applies a single request and returns the reply, if the request has
    /// one.
    ///
    /// Requests which cannot be applied (unknown IDs, wrong grid types and
    /// so on) are logged and dropped.
    pub async fn handle(&mut self, message: ToPathfinder) -> Option<FromPathfinder> {
        match message {
            ToPathfinder::SetPos(position) => {
                self.finder.set_start(self.field.nearest_point(position));
            }
            ToPathfinder::SetGoal(position) => {
                self.finder.set_goal(self.field.nearest_point(position));
            }
            ToPathfinder::GetFieldInfo => {
                return Some(FromPathfinder::FieldInfo(FieldInfoNet::from(&self.field)));
            }
            ToPathfinder::GetGrids => {
                return Some(FromPathfinder::Grids(GridNet::from(self.tree.root())));
            }
            ToPathfinder::GetCellData => {
                let cells = self.tree.cell_data();
                return Some(FromPathfinder::CellData(BitfieldNet::from(&cells)));
            }
            ToPathfinder::GetRobotShape => {
                let shape = self.tree.context().footprint().to_shape();
                return Some(FromPathfinder::RobotShape(ShapeNet::from(&shape)));
            }
            ToPathfinder::AddGrid {
                parent,
                id,
                grid_type,
            } => match GridType::from_id(grid_type) {
                Some(grid_type) => {
                    let result = self.tree.add_grid(parent, id, grid_type);
                    self.apply(result).await;
                }
                None => warn!("Grid {id} of unknown type {grid_type} dropped"),
            },
            ToPathfinder::RemoveGrid(id) => {
                let result = self.tree.remove_grid(id).map(drop);
                self.apply(result).await;
            }
            ToPathfinder::AddShape {
                parent,
                id,
                inverted,
                data,
            } => {
                let result = self
                    .tree
                    .add_shape(parent, Shape::new(id, inverted, data.into()));
                self.apply(result).await;
            }
            ToPathfinder::AlterShape { id, inverted, data } => {
                let result = self
                    .tree
                    .alter_shape(Shape::new(id, inverted, data.into()));
                self.apply(result).await;
            }
            ToPathfinder::RemoveShape(id) => {
                let result = self.tree.remove_shape(id).map(drop);
                self.apply(result).await;
            }
        }

        None
    }

    /// Recomputes the path if anything changed since the last tick and
    /// returns it converted to metres.
    pub fn tick(&mut self) -> Option<FromPathfinder> {
        if !self.finder.is_dirty() {
            return None;
        }

        let graph = GridGraph::with_bias(self.tree.root(), self.bias_x, self.bias_y);
        let field = &self.field;
        let path = self.finder.find_path(&graph).map(|path| {
            path.waypoints()
                .iter()
                .map(|&point| field.point_to_metres(point))
                .collect::<Vec<_>>()
        });
        match path {
            Some(ref points) => debug!("Path of {} waypoints found", points.len()),
            None => debug!("Goal is unreachable"),
        }
        Some(FromPathfinder::Path(path))
    }

    async fn apply(&mut self, result: Result<(), GridError>) {
        match result {
            Ok(()) => {
                self.finder.mark_dirty();
                self.save().await;
            }
            Err(err) => warn!("Grid update dropped: {err}"),
        }
    }

    async fn save(&self) {
        if let Err(err) = store_grids(&self.grids_file, &self.tree).await {
            error!("Failed to store grids: {:?}", err);
        }
    }
}
