/// Handle on whatever plays animation on the skeleton.
///
/// Ragdolls stop and disable it on entry and re-enable it on exit, so the animation takes back
/// control of bone rotations.
pub trait AnimationDriver: Send + Sync {
    fn stop(&mut self);
    fn set_enabled(&mut self, enabled: bool);
    fn is_enabled(&self) -> bool;
}
