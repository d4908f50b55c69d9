use std::convert::TryInto;

/// Internal index into one of the mesh arenas.
///
/// Handles stay valid until the element they refer to is removed. Triangle slots are
/// recycled, so a handle to a removed triangle may later refer to a new one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct FixedHandleImpl<Type> {
    index: u32,
    ty: Type,
}

impl<Type> std::fmt::Debug for FixedHandleImpl<Type> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedHandle")
            .field("index", &self.index)
            .finish()
    }
}

impl<Type: Default> FixedHandleImpl<Type> {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index: index
                .try_into()
                .expect("Index too big - at most 2^32 elements supported"),
            ty: Type::default(),
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub(crate) struct VertexTag;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub(crate) struct TriangleTag;

pub(crate) type FixedVertexHandle = FixedHandleImpl<VertexTag>;
pub(crate) type FixedTriangleHandle = FixedHandleImpl<TriangleTag>;

/// An undirected edge, stored with the smaller vertex handle first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub(crate) struct UndirectedEdge(FixedVertexHandle, FixedVertexHandle);

impl UndirectedEdge {
    pub(crate) fn new(a: FixedVertexHandle, b: FixedVertexHandle) -> Self {
        if a < b {
            UndirectedEdge(a, b)
        } else {
            UndirectedEdge(b, a)
        }
    }

    #[cfg(test)]
    pub(crate) fn vertices(&self) -> [FixedVertexHandle; 2] {
        [self.0, self.1]
    }
}

#[cfg(test)]
mod test {
    use super::{FixedVertexHandle, UndirectedEdge};

    #[test]
    fn test_undirected_edge_is_normalized() {
        let a = FixedVertexHandle::new(3);
        let b = FixedVertexHandle::new(1);
        assert_eq!(UndirectedEdge::new(a, b), UndirectedEdge::new(b, a));
        assert_eq!(UndirectedEdge::new(a, b).vertices(), [b, a]);
        assert_eq!(a.index(), 3);
    }
}
