//! Shape representations, their contexts, geometric items and grid axes.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::domain::{
    error::ValidationError,
    handle::{ContextId, ItemId, RepresentationId},
    measure::{Label, Text, TriBoolean},
};

/// The dimensionality of a geometric representation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CoordinateSpaceDimension {
    /// Planar geometry.
    Two,
    /// Spatial geometry.
    Three,
}

impl CoordinateSpaceDimension {
    /// The dimension as an integer.
    #[must_use]
    pub const fn get(self) -> i64 {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl TryFrom<i64> for CoordinateSpaceDimension {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(ValidationError::InvalidDimension(other)),
        }
    }
}

impl From<CoordinateSpaceDimension> for i64 {
    fn from(value: CoordinateSpaceDimension) -> Self {
        value.get()
    }
}

/// `IfcGeometricRepresentationContext`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentationContext {
    /// Identifier of the context, e.g. "Body".
    pub identifier: Option<Label>,
    /// Type of the context, e.g. "Model" or "Plan".
    pub context_type: Option<Label>,
    /// Two or three dimensional.
    pub coordinate_space_dimension: CoordinateSpaceDimension,
}

impl fmt::Display for RepresentationContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.identifier.as_deref().unwrap_or("None"),
            self.context_type.as_deref().unwrap_or("None")
        )
    }
}

/// `IfcRepresentation`: a set of items in a single context.
///
/// Deleting the context deletes the representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Representation {
    /// The context.
    pub context: ContextId,
    /// Identifier, e.g. "Body" or "Axis".
    pub identifier: Option<Label>,
    /// Type, e.g. "SweptSolid" or "Curve2D".
    pub representation_type: Option<Label>,
    /// The geometric items. Deleting an item removes it from the set.
    pub items: BTreeSet<ItemId>,
}

impl Representation {
    /// An empty representation in the given context.
    #[must_use]
    pub const fn new(context: ContextId) -> Self {
        Self {
            context,
            identifier: None,
            representation_type: None,
            items: BTreeSet::new(),
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.identifier.as_deref().unwrap_or("None"),
            self.representation_type.as_deref().unwrap_or("None")
        )
    }
}

/// `IfcProductRepresentation`: the ordered representations of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRepresentation {
    /// Name.
    pub name: Option<Label>,
    /// Free text.
    pub description: Option<Text>,
    /// The representations, in order. Deleting a representation removes it
    /// from the list.
    pub representations: Vec<RepresentationId>,
}

impl fmt::Display for ProductRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "Product Representation ({} items)", self.representations.len()),
        }
    }
}

/// `IfcCartesianPoint`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianPoint {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate, absent for planar points.
    pub z: Option<f64>,
}

impl CartesianPoint {
    /// A planar point.
    #[must_use]
    pub const fn planar(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// A spatial point.
    #[must_use]
    pub const fn spatial(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

impl fmt::Display for CartesianPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.z {
            Some(z) => write!(f, "Point({}, {}, {z})", self.x, self.y),
            None => write!(f, "Point({}, {})", self.x, self.y),
        }
    }
}

/// The geometry carried by a representation item. Geometry is opaque to the
/// kernel beyond telling curves apart from other items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    /// `IfcCartesianPoint`.
    Point(CartesianPoint),
    /// `IfcLine`, the only curve modelled.
    Line {
        /// Start point.
        start: CartesianPoint,
        /// End point.
        end: CartesianPoint,
    },
}

impl Geometry {
    /// Whether the geometry is an `IfcCurve`.
    #[must_use]
    pub const fn is_curve(&self) -> bool {
        matches!(self, Self::Line { .. })
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Point(point) => write!(f, "{point}"),
            Self::Line { start, end } => write!(f, "Line from {start} to {end}"),
        }
    }
}

/// `IfcGeometricRepresentationItem`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentationItem {
    /// Optional name.
    pub name: Option<Label>,
    /// The geometry.
    pub geometry: Geometry,
}

impl RepresentationItem {
    /// An unnamed item.
    #[must_use]
    pub const fn new(geometry: Geometry) -> Self {
        Self {
            name: None,
            geometry,
        }
    }
}

impl fmt::Display for RepresentationItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.geometry),
        }
    }
}

/// `IfcGridAxis`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridAxis {
    /// The axis tag, e.g. "A" or "1".
    pub axis_tag: Label,
    /// The curve along which the axis runs. Cleared if the curve is deleted.
    pub axis_curve: Option<ItemId>,
    /// Whether the axis runs in the same direction as its curve.
    pub same_sense: TriBoolean,
}

impl GridAxis {
    /// An axis with no curve, running with the curve's sense.
    #[must_use]
    pub fn new(axis_tag: Label) -> Self {
        Self {
            axis_tag,
            axis_curve: None,
            same_sense: TriBoolean::default(),
        }
    }
}

impl fmt::Display for GridAxis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let same_sense = if self.same_sense == TriBoolean::True {
            "Yes"
        } else {
            "No"
        };
        write!(f, "{} (Same Sense: {same_sense})", self.axis_tag)
    }
}
