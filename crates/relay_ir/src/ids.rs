//! Opaque ID newtypes for linked netlist entities.
//!
//! Each ID is a thin `u32` wrapper assigned densely during linking, so it
//! doubles as an index into the owning [`Netlist`](crate::Netlist) arrays and
//! into a backend's flat value arrays.

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the ID as a `usize` array index.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a signal in a linked netlist.
    SignalId
);

define_id!(
    /// Opaque, copyable ID for a memory in a linked netlist.
    MemoryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let id = SignalId::from_raw(7);
        assert_eq!(id.as_raw(), 7);
        assert_eq!(id.index(), 7);
        assert_eq!(id, SignalId::from_raw(7));
        assert_ne!(id, SignalId::from_raw(8));
    }
}
