//! Object placements.
//!
//! A placement positions a product either relative to another local
//! placement, forming a tree, or at a named location on a grid.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{
    handle::{EntityId, PlacementId},
    measure::{Identifier, Label},
};

/// `IfcObjectPlacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectPlacement {
    /// Identifier, unique across every placement in the universe.
    pub placement_id: Identifier,
    /// The local or grid specific part.
    pub kind: PlacementKind,
}

impl ObjectPlacement {
    /// A local placement, optionally relative to another.
    #[must_use]
    pub const fn local(placement_id: Identifier, relative_placement: Option<PlacementId>) -> Self {
        Self {
            placement_id,
            kind: PlacementKind::Local(LocalPlacement { relative_placement }),
        }
    }

    /// A placement at a location on a grid.
    #[must_use]
    pub const fn grid(placement_id: Identifier, grid: EntityId, placement_location: Label) -> Self {
        Self {
            placement_id,
            kind: PlacementKind::Grid(GridPlacement {
                grid,
                placement_location,
            }),
        }
    }

    /// The parent placement, for local placements.
    #[must_use]
    pub const fn relative_placement(&self) -> Option<PlacementId> {
        match &self.kind {
            PlacementKind::Local(local) => local.relative_placement,
            PlacementKind::Grid(_) => None,
        }
    }

    /// Whether this is a local placement.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self.kind, PlacementKind::Local(_))
    }

    /// The grid, for grid placements.
    #[must_use]
    pub const fn grid_entity(&self) -> Option<EntityId> {
        match &self.kind {
            PlacementKind::Grid(grid) => Some(grid.grid),
            PlacementKind::Local(_) => None,
        }
    }

    pub(crate) const fn clear_relative_placement(&mut self) {
        if let PlacementKind::Local(local) = &mut self.kind {
            local.relative_placement = None;
        }
    }
}

/// The two kinds of placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlacementKind {
    /// `IfcLocalPlacement`.
    Local(LocalPlacement),
    /// `IfcGridPlacement`.
    Grid(GridPlacement),
}

/// `IfcLocalPlacement`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPlacement {
    /// The parent. Must itself be a local placement, and may not be a
    /// descendant of this placement.
    pub relative_placement: Option<PlacementId>,
}

/// `IfcGridPlacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPlacement {
    /// The grid. Deleting the grid deletes the placement.
    pub grid: EntityId,
    /// The location on the grid, typically an axis intersection such as
    /// "A/1".
    pub placement_location: Label,
}

impl fmt::Display for ObjectPlacement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            PlacementKind::Local(_) => write!(f, "Local Placement {}", self.placement_id),
            PlacementKind::Grid(grid) => write!(f, "Grid Placement at {}", grid.placement_location),
        }
    }
}
