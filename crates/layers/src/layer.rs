use foundation::Aabb2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

pub trait Layer {
    fn id(&self) -> LayerId;

    /// Map-space extent outside of which the layer draws nothing. `None` means the layer
    /// currently has nothing to draw at all.
    fn extent(&self) -> Option<Aabb2>;
}
