use bevy_log::{debug, info, warn};

use super::{Biped, RequiredParts};
use crate::core::{
    errors::BipedResult,
    part::PartId,
    physics::PhysicsBackend,
    roles::Side,
    skeleton::SkeletonHierarchy,
};

/// Spring stiffness pulling joints back to their animated pose.
pub const DEFAULT_RESISTANCE: f32 = 15.;
/// Torque cap of the joint springs.
pub const DEFAULT_MAX_FORCE: f32 = 85.;

impl Biped {
    /// [`Biped::create_ragdoll`] with [`DEFAULT_RESISTANCE`] and [`DEFAULT_MAX_FORCE`].
    pub fn create_default_ragdoll<S, P>(&mut self, scene: &mut S, physics: &mut P) -> BipedResult<bool>
    where
        S: SkeletonHierarchy + ?Sized,
        P: PhysicsBackend + ?Sized,
    {
        self.create_ragdoll(scene, physics, DEFAULT_RESISTANCE, DEFAULT_MAX_FORCE)
    }

    /// Hands the skeleton over to physics.
    ///
    /// Stops the animation, gives every colliding part a collider and joins each rigid part to
    /// the rigid part above it, from the head down and from the torso out. Joints spring back
    /// toward the current pose with the given stiffness and torque cap.
    ///
    /// Returns `Ok(false)` without doing anything if the biped already is a ragdoll. If building
    /// fails partway, every primitive created so far is destroyed and the animation is handed
    /// back before the error is returned.
    pub fn create_ragdoll<S, P>(
        &mut self,
        scene: &mut S,
        physics: &mut P,
        resistance: f32,
        max_force: f32,
    ) -> BipedResult<bool>
    where
        S: SkeletonHierarchy + ?Sized,
        P: PhysicsBackend + ?Sized,
    {
        let required = self.required()?;
        if self.is_ragdoll {
            debug!("{:?} already is a ragdoll", scene.name(self.root));
            return Ok(false);
        }

        if let Some(animation) = self.animation.as_mut() {
            animation.stop();
            animation.set_enabled(false);
        }

        if let Err(error) = self.build_ragdoll(scene, physics, required, resistance, max_force) {
            warn!(
                "Could not create ragdoll for {:?}: {error}",
                scene.name(self.root)
            );
            self.release_all_physics(physics)?;
            if let Some(animation) = self.animation.as_mut() {
                animation.set_enabled(true);
            }
            return Err(error);
        }
        self.is_ragdoll = true;

        info!("Created ragdoll for {:?}", scene.name(self.root));
        Ok(true)
    }

    fn build_ragdoll<S, P>(
        &mut self,
        scene: &mut S,
        physics: &mut P,
        required: RequiredParts,
        resistance: f32,
        max_force: f32,
    ) -> BipedResult<()>
    where
        S: SkeletonHierarchy + ?Sized,
        P: PhysicsBackend + ?Sized,
    {
        for id in self.all_parts() {
            if self.parts.part(id)?.is_collider {
                self.parts.add_collision_shape(physics, id)?;
            }
        }

        let slots = self.slots.clone();
        let mut connect = |biped: &mut Biped, id: PartId, target: PartId| {
            biped
                .parts
                .connect_to(scene, physics, id, target, resistance, max_force)
                .map(|_| ())
        };

        connect(
            self,
            required.head,
            slots.neck.last().copied().unwrap_or(required.last_spine),
        )?;
        for (i, &neck) in slots.neck.iter().enumerate().rev() {
            let target = if i == 0 {
                required.last_spine
            } else {
                slots.neck[i - 1]
            };
            connect(self, neck, target)?;
        }
        for (i, &spine) in slots.spine.iter().enumerate().rev() {
            let target = if i == 0 {
                required.pelvis
            } else {
                slots.spine[i - 1]
            };
            connect(self, spine, target)?;
        }

        for side in Side::BOTH {
            let limbs = *required.side(side);
            let collar = match slots.side(side).collar {
                Some(collar) if self.parts.part(collar)?.is_rigid_body => Some(collar),
                _ => None,
            };
            match collar {
                Some(collar) => {
                    connect(self, collar, required.last_spine)?;
                    connect(self, limbs.upper_arm, collar)?;
                }
                None => connect(self, limbs.upper_arm, required.last_spine)?,
            }
            connect(self, limbs.forearm, limbs.upper_arm)?;
            if self.parts.part(limbs.hand)?.is_rigid_body {
                connect(self, limbs.hand, limbs.forearm)?;
            }
        }

        for side in Side::BOTH {
            let limbs = *required.side(side);
            connect(self, limbs.hip, required.pelvis)?;
            connect(self, limbs.lower_leg, limbs.hip)?;
            if self.parts.part(limbs.foot)?.is_rigid_body {
                connect(self, limbs.foot, limbs.lower_leg)?;
                if let Some(toe) = slots.side(side).toe {
                    if self.parts.part(toe)?.is_rigid_body {
                        connect(self, toe, limbs.foot)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Gives the skeleton back to animation.
    ///
    /// Every physics primitive is destroyed and bones return to their snapshotted local
    /// positions, except that the pelvis stays where physics left it so the character doesn't
    /// teleport. Rotations are left for the animation to drive. Returns `Ok(false)` if the
    /// biped is not a ragdoll.
    ///
    /// The biped is posed again even when the error comes from a required part having gone
    /// missing; only the snapping back of the bones is skipped then.
    pub fn remove_ragdoll<S, P>(&mut self, scene: &mut S, physics: &mut P) -> BipedResult<bool>
    where
        S: SkeletonHierarchy + ?Sized,
        P: PhysicsBackend + ?Sized,
    {
        if !self.is_ragdoll {
            return Ok(false);
        }
        self.release_all_physics(physics)?;
        self.is_ragdoll = false;
        if let Some(animation) = self.animation.as_mut() {
            animation.set_enabled(true);
        }

        let required = self.required()?;
        let pelvis_position = self.position(scene, required.pelvis)?;
        for id in self.all_parts() {
            self.parts.part(id)?.reset_to_position_snapshot(scene);
        }
        let pelvis = self.parts.part(required.pelvis)?.node();
        scene.set_global_translation(pelvis, pelvis_position);

        info!("Removed ragdoll for {:?}", scene.name(self.root));
        Ok(true)
    }

    /// Destroys the primitives of every registered part, assigned to a role or not.
    fn release_all_physics<P: PhysicsBackend + ?Sized>(
        &mut self,
        physics: &mut P,
    ) -> BipedResult<()> {
        for id in self.parts.ids() {
            self.parts.release_physics(physics, id)?;
        }
        Ok(())
    }
}
