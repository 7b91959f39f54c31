//! This module contains configuration object which can be (de)serialized from
//! a configuration file. It does not contain final configuration object which
//! must be build and validated from the objects here.
//!
//! Missing values are replaced by their defaults.

use std::path::PathBuf;

use pf_pathing::FinderType;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub(super) struct Configuration {
    pub(super) messenger: Messenger,
    pub(super) field: Field,
    pub(super) grids_file: PathBuf,
    pub(super) finder: FinderType,
    pub(super) bias_x: f64,
    pub(super) bias_y: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            messenger: Messenger::default(),
            field: Field::default(),
            grids_file: PathBuf::from("grids.json"),
            finder: FinderType::ThetaStar,
            bias_x: 1.,
            bias_y: 1.,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub(super) struct Messenger {
    pub(super) host: String,
    pub(super) port: u16,
    pub(super) name: String,
}

impl Default for Messenger {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 5805,
            name: "Pathfinder".to_owned(),
        }
    }
}

/// Dimensions of a standard FRC field with six inch cells and the origin in
/// the center.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub(super) struct Field {
    pub(super) width: f64,
    pub(super) height: f64,
    pub(super) cell_size: f64,
    pub(super) origin_x: f64,
    pub(super) origin_y: f64,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            width: 8.2296,
            height: 16.4592,
            cell_size: 0.1524,
            origin_x: 0.5,
            origin_y: 0.5,
        }
    }
}
