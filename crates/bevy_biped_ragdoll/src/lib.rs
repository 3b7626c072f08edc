//! # Bevy Biped Ragdoll
//!
//! **Bevy Biped Ragdoll** turns an animated humanoid skeleton into a physics ragdoll and back.
//!
//! ## Introduction
//!
//! The central type is the [`Biped`], which maps the anatomical roles of a skeleton (head,
//! spine, pelvis, limbs and so on) to [`Part`]s carrying everything a ragdoll needs: mass,
//! collider shape, joint axes and joint limits.
//!
//! Setting up a biped is a single call to [`Biped::automate_setup`], which:
//! 1. Finds the bones by name using a [`NamingConvention`]. HumanIK, Maya and 3ds Max names are
//!    built in, and custom conventions can be loaded from RON:
//!    ```ron
//!    (
//!        character_name_prefix: "mixamorig:",
//!        hand_tip: "HandMiddle1",
//!    )
//!    ```
//! 2. Pairs left and right parts so edits on one side can be mirrored to the other.
//! 3. Picks collider shapes and sizes them from the character's height.
//! 4. Orients joint axes and applies anatomical joint limits.
//! 5. Spreads the total mass over the parts by anatomical proportion.
//!
//! Every step can also be run on its own, after editing role assignments or part settings by
//! hand.
//!
//! ## Ragdoll state
//!
//! A set up biped is either posed, with an [`AnimationDriver`] moving its bones, or a ragdoll.
//! [`Biped::create_ragdoll`] stops the animation and builds rigid bodies, colliders and
//! spring-driven joints through a [`PhysicsBackend`]. The springs pull each joint toward the
//! pose it had when the ragdoll was created. [`Biped::remove_ragdoll`] destroys it all again and
//! hands the skeleton back to the animation, leaving the pelvis wherever physics dropped it.
//!
//! The skeleton itself is reached through [`SkeletonHierarchy`]. [`Skeleton`] is a standalone
//! implementation, handy for tools and tests.
//!
//! ## Physics backends
//!
//! With the `physics_avian` feature, `AvianPhysics` implements [`PhysicsBackend`] on top of
//! [avian3d](https://docs.rs/avian3d), spawning its components through Bevy `Commands`.
//!
//! [`Biped`]: crate::core::biped::Biped
//! [`Biped::automate_setup`]: crate::core::biped::Biped::automate_setup
//! [`Biped::create_ragdoll`]: crate::core::biped::Biped::create_ragdoll
//! [`Biped::remove_ragdoll`]: crate::core::biped::Biped::remove_ragdoll
//! [`Part`]: crate::core::part::Part
//! [`NamingConvention`]: crate::core::naming::NamingConvention
//! [`AnimationDriver`]: crate::core::animation::AnimationDriver
//! [`PhysicsBackend`]: crate::core::physics::PhysicsBackend
//! [`SkeletonHierarchy`]: crate::core::skeleton::SkeletonHierarchy
//! [`Skeleton`]: crate::core::skeleton::Skeleton

pub mod core;
pub mod utils;

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::utils::geometry::AxisTripod;
}
