/// Index of a marker inside a live map, assigned in stop order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(u32);

impl MarkerId {
    pub fn new(index: u32) -> Self {
        MarkerId(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

/// Index of an element registered with the reveal controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(u32);

impl TargetId {
    pub fn new(index: u32) -> Self {
        TargetId(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}
