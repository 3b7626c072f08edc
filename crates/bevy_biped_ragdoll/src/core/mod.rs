pub mod animation;
pub mod biped;
pub mod errors;
pub mod naming;
pub mod part;
pub mod physics;
pub mod resolver;
pub mod roles;
pub mod skeleton;

#[cfg(test)]
pub(crate) mod testing;

pub mod prelude {
    use super::*;
    pub use animation::AnimationDriver;
    pub use biped::*;
    pub use errors::*;
    pub use naming::{NamingConvention, NamingPreset};
    pub use part::*;
    pub use physics::*;
    pub use roles::*;
    pub use skeleton::*;
}
