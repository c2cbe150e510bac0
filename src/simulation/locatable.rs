//! Trait for entities that occupy a position in the world.

use super::geometry::Vec2;

/// An entity with a position and a collision radius.
///
/// Implemented by agents and resources so the spatial index can be built
/// over either.
pub trait Locatable {
    /// Position of the entity's center.
    fn pos(&self) -> Vec2;

    /// Radius of a circle enclosing the entity.
    fn bounding_radius(&self) -> f32;
}

impl Locatable for super::resource::Resource {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn bounding_radius(&self) -> f32 {
        self.radius
    }
}
