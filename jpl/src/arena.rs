//! Append-only storage with typed handles.
use std::{fmt, marker::PhantomData, ops};

/// Handle into an [`Arena`].
pub trait NodeId: Copy + Eq + fmt::Debug {
    fn new(index: usize) -> Self;
    fn index(self) -> usize;
}

macro_rules! node_id {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(u32);

            impl NodeId for $name {
                #[inline]
                fn new(index: usize) -> Self {
                    debug_assert!(index <= u32::MAX as usize);
                    Self(index as u32)
                }

                #[inline]
                fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

node_id! {
    /// Index of a token in the lexed token vector.
    TokenId;
    CmdId;
    ExprId;
    LValueId;
    StmtId;
    TypeId;
    BindingId;
    /// Declared name, either from source or synthesized for a built-in.
    VarId;
}

/// Growable array that owns its nodes.
///
/// Nodes are only ever appended, so a handle returned by [`Arena::push`]
/// stays valid for the lifetime of the arena and always points at a node
/// that was created before any node referring to it.
pub struct Arena<I, T> {
    nodes: Vec<T>,
    _id: PhantomData<I>,
}

impl<I: NodeId, T> Arena<I, T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            _id: PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            _id: PhantomData,
        }
    }

    /// Append a node and return its handle.
    #[inline]
    pub fn push(&mut self, node: T) -> I {
        let id = I::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    #[inline]
    pub fn get(&self, id: I) -> Option<&T> {
        self.nodes.get(id.index())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Handle of the most recently pushed node.
    pub fn last_id(&self) -> Option<I> {
        self.nodes.len().checked_sub(1).map(I::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (I::new(index), node))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.nodes
    }
}

impl<I: NodeId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: NodeId, T: fmt::Debug> fmt::Debug for Arena<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.nodes.iter()).finish()
    }
}

impl<I: NodeId, T> ops::Index<I> for Arena<I, T> {
    type Output = T;

    #[inline]
    fn index(&self, id: I) -> &T {
        &self.nodes[id.index()]
    }
}

impl<I: NodeId, T> ops::IndexMut<I> for Arena<I, T> {
    #[inline]
    fn index_mut(&mut self, id: I) -> &mut T {
        &mut self.nodes[id.index()]
    }
}
