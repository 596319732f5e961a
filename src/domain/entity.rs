//! The Root-derived entity hierarchy.
//!
//! IFC describes a chain of abstract supertypes:
//!
//! ```text
//! IfcRoot
//! └── IfcObjectDefinition
//!     ├── IfcObject ── IfcActor
//!     ├── IfcProduct ── IfcGrid
//!     └── IfcProject
//! ```
//!
//! Each concrete entity here literally contains the fields of every ancestor
//! layer ([`Root`] inside [`ObjectDefinition`] inside [`Product`], and so on).
//! [`specialize`] builds a concrete entity from raw input, running the checks
//! of each layer in ancestor to descendant order so that a descendant field is
//! never accepted before its ancestors are valid.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::domain::{
    actor::ActorSelect,
    error::{Error, StateError},
    handle::{
        ContextId, GridAxisId, OwnerHistoryId, PlacementId, ProductRepresentationId,
        UnitAssignmentId,
    },
    measure::{Guid, Label, Text},
};

/// The concrete kinds of Root-derived entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// `IfcObject`.
    Object,
    /// `IfcActor`.
    Actor,
    /// `IfcProduct`.
    Product,
    /// `IfcGrid`.
    Grid,
    /// `IfcProject`.
    Project,
}

impl EntityType {
    /// The IFC entity name.
    #[must_use]
    pub const fn ifc_name(self) -> &'static str {
        match self {
            Self::Object => "IfcObject",
            Self::Actor => "IfcActor",
            Self::Product => "IfcProduct",
            Self::Grid => "IfcGrid",
            Self::Project => "IfcProject",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.ifc_name())
    }
}

/// The `IfcRoot` layer shared by every entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    global_id: Guid,
    /// Optional name.
    pub name: Option<Label>,
    /// Optional free text.
    pub description: Option<Text>,
    /// The audit record. Cleared if the owner history is deleted.
    pub owner_history: Option<OwnerHistoryId>,
}

impl Root {
    /// A root layer with the given id and nothing else.
    #[must_use]
    pub const fn new(global_id: Guid) -> Self {
        Self {
            global_id,
            name: None,
            description: None,
            owner_history: None,
        }
    }

    /// The globally unique id. It is fixed once the entity is created.
    #[must_use]
    pub const fn global_id(&self) -> &Guid {
        &self.global_id
    }
}

/// The `IfcObjectDefinition` layer. It adds no fields of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDefinition {
    /// The `IfcRoot` layer.
    pub root: Root,
}

/// `IfcObject`: an object definition with a type label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    /// The `IfcObjectDefinition` layer.
    pub definition: ObjectDefinition,
    /// Free-form type of the object.
    pub object_type: Option<Label>,
}

/// `IfcActor`: an object standing for a person, organization or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The `IfcObject` layer.
    pub object: Object,
    /// The actor. Deleting the target does not delete the actor, so this may
    /// dangle until it is reassigned.
    pub the_actor: ActorSelect,
}

/// `IfcProduct`: something that can be placed and shaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// The `IfcObjectDefinition` layer.
    pub definition: ObjectDefinition,
    /// Where the product is. Cleared if the placement is deleted.
    pub object_placement: Option<PlacementId>,
    /// What the product looks like. Cleared if the representation is deleted.
    pub representation: Option<ProductRepresentationId>,
}

/// `IfcGrid`: a product made of intersecting axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// The `IfcProduct` layer.
    pub product: Product,
    /// The first row of axes.
    pub u_axes: BTreeSet<GridAxisId>,
    /// The second row of axes.
    pub v_axes: BTreeSet<GridAxisId>,
    /// The third row of axes, present only for three-dimensional grids.
    pub w_axes: Option<BTreeSet<GridAxisId>>,
}

impl Grid {
    /// Whether the grid has a third row of axes.
    #[must_use]
    pub const fn is_3d(&self) -> bool {
        self.w_axes.is_some()
    }

    /// Every axis of the grid, in u, v, w order.
    pub fn axes(&self) -> impl Iterator<Item = GridAxisId> + '_ {
        self.u_axes
            .iter()
            .chain(&self.v_axes)
            .chain(self.w_axes.iter().flatten())
            .copied()
    }

    pub(crate) fn remove_axis(&mut self, axis: GridAxisId) -> bool {
        let mut removed = self.u_axes.remove(&axis);
        removed |= self.v_axes.remove(&axis);
        if let Some(w_axes) = &mut self.w_axes {
            removed |= w_axes.remove(&axis);
        }
        removed
    }
}

/// `IfcProject`: the context in which every other object is defined.
///
/// A project must be named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// The `IfcObjectDefinition` layer.
    pub definition: ObjectDefinition,
    /// Longer, more descriptive name.
    pub long_name: Option<Label>,
    /// Current project phase, e.g. "design" or "construction".
    pub phase: Option<Label>,
    /// Default units. A unit assignment cannot be deleted while a project uses
    /// it.
    pub units_in_context: Option<UnitAssignmentId>,
    /// Contexts of the project's representations.
    pub representation_contexts: BTreeSet<ContextId>,
}

/// A Root-derived entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Entity {
    /// `IfcObject`.
    Object(Object),
    /// `IfcActor`.
    Actor(Actor),
    /// `IfcProduct`.
    Product(Product),
    /// `IfcGrid`.
    Grid(Grid),
    /// `IfcProject`.
    Project(Project),
}

impl Entity {
    /// The concrete kind.
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        match self {
            Self::Object(_) => EntityType::Object,
            Self::Actor(_) => EntityType::Actor,
            Self::Product(_) => EntityType::Product,
            Self::Grid(_) => EntityType::Grid,
            Self::Project(_) => EntityType::Project,
        }
    }

    /// The `IfcObjectDefinition` layer.
    #[must_use]
    pub const fn definition(&self) -> &ObjectDefinition {
        match self {
            Self::Object(object) => &object.definition,
            Self::Actor(actor) => &actor.object.definition,
            Self::Product(product) => &product.definition,
            Self::Grid(grid) => &grid.product.definition,
            Self::Project(project) => &project.definition,
        }
    }

    /// The `IfcObjectDefinition` layer, mutably.
    pub const fn definition_mut(&mut self) -> &mut ObjectDefinition {
        match self {
            Self::Object(object) => &mut object.definition,
            Self::Actor(actor) => &mut actor.object.definition,
            Self::Product(product) => &mut product.definition,
            Self::Grid(grid) => &mut grid.product.definition,
            Self::Project(project) => &mut project.definition,
        }
    }

    /// The `IfcRoot` layer.
    #[must_use]
    pub const fn root(&self) -> &Root {
        &self.definition().root
    }

    /// The `IfcRoot` layer, mutably.
    pub const fn root_mut(&mut self) -> &mut Root {
        &mut self.definition_mut().root
    }

    /// The globally unique id.
    #[must_use]
    pub const fn global_id(&self) -> &Guid {
        self.root().global_id()
    }

    /// The `IfcObject` layer, for objects and actors.
    #[must_use]
    pub const fn object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            Self::Actor(actor) => Some(&actor.object),
            _ => None,
        }
    }

    /// The `IfcProduct` layer, for products and grids.
    #[must_use]
    pub const fn product(&self) -> Option<&Product> {
        match self {
            Self::Product(product) => Some(product),
            Self::Grid(grid) => Some(&grid.product),
            _ => None,
        }
    }

    /// The `IfcProduct` layer, mutably.
    pub const fn product_mut(&mut self) -> Option<&mut Product> {
        match self {
            Self::Product(product) => Some(product),
            Self::Grid(grid) => Some(&mut grid.product),
            _ => None,
        }
    }

    /// The grid, if this is one.
    #[must_use]
    pub const fn grid(&self) -> Option<&Grid> {
        match self {
            Self::Grid(grid) => Some(grid),
            _ => None,
        }
    }

    /// The actor, if this is one.
    #[must_use]
    pub const fn actor(&self) -> Option<&Actor> {
        match self {
            Self::Actor(actor) => Some(actor),
            _ => None,
        }
    }

    /// The project, if this is one.
    #[must_use]
    pub const fn project(&self) -> Option<&Project> {
        match self {
            Self::Project(project) => Some(project),
            _ => None,
        }
    }

    /// Re-runs the layer rules that do not depend on other records.
    pub(crate) fn check_layers(&self) -> Result<(), StateError> {
        if let Self::Project(project) = self {
            require_project_name(project.definition.root.name.as_ref())?;
        }
        Ok(())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = self
            .root()
            .name
            .as_ref()
            .map_or("Unnamed IFC Object", Label::as_str);
        match self {
            Self::Object(Object {
                object_type: Some(object_type),
                ..
            })
            | Self::Actor(Actor {
                object:
                    Object {
                        object_type: Some(object_type),
                        ..
                    },
                ..
            }) => write!(f, "{name} - {object_type}"),
            Self::Project(Project {
                long_name: Some(long_name),
                phase,
                ..
            }) => match phase {
                Some(phase) => write!(f, "{long_name} - Phase: {phase}"),
                None => write!(f, "{long_name}"),
            },
            _ => f.write_str(name),
        }
    }
}

const fn require_project_name(name: Option<&Label>) -> Result<(), StateError> {
    if name.is_none() {
        return Err(StateError::MissingRequiredAncestorField {
            entity: "IfcProject",
            layer: "IfcRoot",
            field: "Name",
        });
    }
    Ok(())
}

/// Raw input for the `IfcRoot` layer, before validation.
///
/// [`RootDraft::new`] pre-assigns a freshly generated GUID. A draft built with
/// [`Default`] has none, and [`specialize`] rejects it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootDraft {
    /// The 22 character GUID.
    pub global_id: Option<String>,
    /// The name.
    pub name: Option<String>,
    /// The description.
    pub description: Option<String>,
    /// The owner history.
    pub owner_history: Option<OwnerHistoryId>,
}

impl RootDraft {
    /// A draft with a freshly generated GUID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            global_id: Some(Guid::generate().into()),
            ..Self::default()
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the owner history.
    #[must_use]
    pub const fn with_owner_history(mut self, owner_history: OwnerHistoryId) -> Self {
        self.owner_history = Some(owner_history);
        self
    }
}

/// Raw input for the `IfcProduct` layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductDraft {
    /// The placement.
    pub object_placement: Option<PlacementId>,
    /// The representation.
    pub representation: Option<ProductRepresentationId>,
}

/// The fields a concrete entity adds on top of the `IfcRoot` layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specialization {
    /// `IfcObject`.
    Object {
        /// Free-form object type.
        object_type: Option<String>,
    },
    /// `IfcActor`.
    Actor {
        /// Free-form object type.
        object_type: Option<String>,
        /// The actor.
        the_actor: ActorSelect,
    },
    /// `IfcProduct`.
    Product(ProductDraft),
    /// `IfcGrid`.
    Grid {
        /// The product layer.
        product: ProductDraft,
        /// The first row of axes.
        u_axes: BTreeSet<GridAxisId>,
        /// The second row of axes.
        v_axes: BTreeSet<GridAxisId>,
        /// The third row of axes, if any.
        w_axes: Option<BTreeSet<GridAxisId>>,
    },
    /// `IfcProject`.
    Project {
        /// Longer name.
        long_name: Option<String>,
        /// Project phase.
        phase: Option<String>,
        /// Default units.
        units_in_context: Option<UnitAssignmentId>,
        /// Representation contexts.
        representation_contexts: BTreeSet<ContextId>,
    },
}

impl Specialization {
    /// The kind of entity this specialization produces.
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        match self {
            Self::Object { .. } => EntityType::Object,
            Self::Actor { .. } => EntityType::Actor,
            Self::Product(_) => EntityType::Product,
            Self::Grid { .. } => EntityType::Grid,
            Self::Project { .. } => EntityType::Project,
        }
    }
}

/// Builds a concrete entity from a root draft and the fields its own layers
/// add.
///
/// Layers are checked from `IfcRoot` downwards. This function validates
/// values only; uniqueness of the GUID and existence of referenced records
/// are checked when the entity is inserted into a
/// [`Universe`](crate::Universe).
///
/// # Errors
///
/// - [`StateError::MissingRequiredAncestorField`] if the draft has no
///   `GlobalId`, or a project has no `Name`.
/// - A [`ValidationError`](crate::ValidationError) if any value is malformed.
pub fn specialize(base: RootDraft, extra: Specialization) -> Result<Entity, Error> {
    let entity_type = extra.entity_type();
    let definition = ObjectDefinition {
        root: root_layer(entity_type, base)?,
    };

    let entity = match extra {
        Specialization::Object { object_type } => Entity::Object(Object {
            definition,
            object_type: Label::optional(object_type)?,
        }),
        Specialization::Actor {
            object_type,
            the_actor,
        } => Entity::Actor(Actor {
            object: Object {
                definition,
                object_type: Label::optional(object_type)?,
            },
            the_actor,
        }),
        Specialization::Product(product) => Entity::Product(product_layer(definition, product)),
        Specialization::Grid {
            product,
            u_axes,
            v_axes,
            w_axes,
        } => Entity::Grid(Grid {
            product: product_layer(definition, product),
            u_axes,
            v_axes,
            w_axes,
        }),
        Specialization::Project {
            long_name,
            phase,
            units_in_context,
            representation_contexts,
        } => {
            require_project_name(definition.root.name.as_ref())?;
            Entity::Project(Project {
                definition,
                long_name: Label::optional(long_name)?,
                phase: Label::optional(phase)?,
                units_in_context,
                representation_contexts,
            })
        }
    };
    Ok(entity)
}

fn root_layer(entity_type: EntityType, draft: RootDraft) -> Result<Root, Error> {
    let global_id = draft
        .global_id
        .ok_or(StateError::MissingRequiredAncestorField {
            entity: entity_type.ifc_name(),
            layer: "IfcRoot",
            field: "GlobalId",
        })?;
    Ok(Root {
        global_id: Guid::try_from(global_id)?,
        name: Label::optional(draft.name)?,
        description: draft.description.map(Text::from),
        owner_history: draft.owner_history,
    })
}

const fn product_layer(definition: ObjectDefinition, draft: ProductDraft) -> Product {
    Product {
        definition,
        object_placement: draft.object_placement,
        representation: draft.representation,
    }
}
