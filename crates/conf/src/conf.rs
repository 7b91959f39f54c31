//! This module implements final (i.e. parsed and validated) configuration
//! objects and their building from persistent configuration.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Error, Result};
use pf_geom::Field;
use pf_grid::MAX_SIGHT_POINTS;
use pf_pathing::FinderType;

use crate::persisted;

#[derive(Debug, Clone)]
pub struct Configuration {
    messenger: MessengerConf,
    field: Field,
    grids_file: PathBuf,
    finder: FinderType,
    bias_x: f64,
    bias_y: f64,
}

impl Configuration {
    /// Builds the configuration without validation.
    fn build(raw: persisted::Configuration) -> Self {
        let field = raw.field;
        Self {
            messenger: MessengerConf {
                host: raw.messenger.host,
                port: raw.messenger.port,
                name: raw.messenger.name,
            },
            field: Field::new(
                field.cell_size,
                field.width,
                field.height,
                field.origin_x,
                field.origin_y,
            ),
            grids_file: raw.grids_file,
            finder: raw.finder,
            bias_x: raw.bias_x,
            bias_y: raw.bias_y,
        }
    }

    pub fn messenger(&self) -> &MessengerConf {
        &self.messenger
    }

    /// Field dimensions and its discretization.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Path to the file with persisted grids and the robot footprint.
    pub fn grids_file(&self) -> &Path {
        self.grids_file.as_path()
    }

    pub fn finder(&self) -> FinderType {
        self.finder
    }

    /// Multiplier of X distances used by the path search.
    pub fn bias_x(&self) -> f64 {
        self.bias_x
    }

    /// Multiplier of Y distances used by the path search.
    pub fn bias_y(&self) -> f64 {
        self.bias_y
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::build(persisted::Configuration::default())
    }
}

impl TryFrom<persisted::Configuration> for Configuration {
    type Error = Error;

    fn try_from(raw: persisted::Configuration) -> Result<Self> {
        ensure!(!raw.messenger.host.is_empty(), "`messenger.host` must not be empty.");
        ensure!(!raw.messenger.name.is_empty(), "`messenger.name` must not be empty.");
        ensure!(
            raw.messenger.name.len() <= usize::from(u16::MAX),
            "`messenger.name` is too long."
        );

        let field = &raw.field;
        ensure!(
            field.cell_size.is_finite() && field.cell_size > 0.,
            "`field.cell_size` must be a positive number."
        );
        ensure!(
            field.width.is_finite() && field.width > 0.,
            "`field.width` must be a positive number."
        );
        ensure!(
            field.height.is_finite() && field.height > 0.,
            "`field.height` must be a positive number."
        );
        let points_x = (field.width / field.cell_size).ceil() + 1.;
        let points_y = (field.height / field.cell_size).ceil() + 1.;
        ensure!(
            points_x * points_y <= MAX_SIGHT_POINTS as f64,
            "The field must not have more than {MAX_SIGHT_POINTS} lattice points, \
             it has {points_x}×{points_y}."
        );
        ensure!(
            field.origin_x.is_finite() && field.origin_y.is_finite(),
            "`field.origin_x` and `field.origin_y` must be finite."
        );

        ensure!(
            !raw.grids_file.as_os_str().is_empty(),
            "`grids_file` must not be empty."
        );
        ensure!(
            raw.bias_x.is_finite() && raw.bias_x > 0.,
            "`bias_x` must be a positive number."
        );
        ensure!(
            raw.bias_y.is_finite() && raw.bias_y > 0.,
            "`bias_y` must be a positive number."
        );

        Ok(Self::build(raw))
    }
}

#[derive(Debug, Clone)]
pub struct MessengerConf {
    host: String,
    port: u16,
    name: String,
}

impl MessengerConf {
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Name under which the pathfinder identifies itself to the message
    /// bus.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Address of the message bus server in `host:port` form.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
