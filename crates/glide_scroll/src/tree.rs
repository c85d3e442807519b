//! View tree arena
//!
//! Nodes live in a [`SlotMap`] and refer to their parent by [`NodeId`].
//! Ids are not owning: a removed node leaves stale ids behind, and every
//! lookup through one simply comes back empty.
//!
//! Nodes hosting a [`NestableScrollContainer`] are checked out of the arena
//! while one of their methods runs, so a container can call into its
//! nested-scroll parent through the [`ScrollChain`] it is handed.

use glide_core::events::event_types;
use glide_core::{Axis, Event};
use slotmap::{new_key_type, Key, KeyData, SlotMap};
use smallvec::SmallVec;
use thiserror::Error;

use crate::nested::{ContainerKind, NestableScrollContainer, NestedScrollOptions, NestedState, ParentsMap, ScrollResult};
use crate::source::ScrollSource;

new_key_type! {
    pub struct NodeId;
}

impl NodeId {
    /// Encoding used for [`Event::target`]
    pub fn to_ffi(self) -> u64 {
        self.data().as_ffi()
    }

    pub fn from_ffi(value: u64) -> Self {
        KeyData::from_ffi(value).into()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("parent node {0:?} not found")]
    ParentNotFound(NodeId),

    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),

    #[error("the root node cannot be removed")]
    RemoveRoot,
}

pub type Ancestors = SmallVec<[NodeId; 8]>;

pub struct ViewNode {
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
    tag: String,
    container: Option<Box<dyn NestableScrollContainer>>,
}

impl std::fmt::Debug for ViewNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewNode")
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("tag", &self.tag)
            .field("container", &self.container.as_ref().map(|c| c.kind()))
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ViewTree {
    nodes: SlotMap<NodeId, ViewNode>,
    root: Option<NodeId>,
}

impl ViewTree {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Create the root node, replacing any previous tree
    pub fn insert_root(
        &mut self,
        tag: impl Into<String>,
        container: Option<Box<dyn NestableScrollContainer>>,
    ) -> NodeId {
        self.nodes.clear();
        let id = self.nodes.insert(ViewNode {
            parent: None,
            children: SmallVec::new(),
            tag: tag.into(),
            container,
        });
        self.root = Some(id);
        id
    }

    pub fn insert(
        &mut self,
        parent: NodeId,
        tag: impl Into<String>,
        container: Option<Box<dyn NestableScrollContainer>>,
    ) -> Result<NodeId, TreeError> {
        if !self.nodes.contains_key(parent) {
            return Err(TreeError::ParentNotFound(parent));
        }
        let id = self.nodes.insert(ViewNode {
            parent: Some(parent),
            children: SmallVec::new(),
            tag: tag.into(),
            container,
        });
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(id);
        }
        Ok(id)
    }

    /// Remove a node and its subtree
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        if self.root == Some(id) {
            return Err(TreeError::RemoveRoot);
        }
        let node = self.nodes.remove(id).ok_or(TreeError::NodeNotFound(id))?;
        if let Some(parent) = node.parent.and_then(|parent| self.nodes.get_mut(parent)) {
            parent.children.retain(|child| *child != id);
        }
        let mut pending: Vec<NodeId> = node.children.into_iter().collect();
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.nodes.remove(child) {
                pending.extend(removed.children);
            }
        }
        tracing::debug!("removed node {:?} ({})", id, node.tag);
        Ok(())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).map(|node| node.tag.as_str())
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors {
        let mut ancestors = Ancestors::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            ancestors.push(node);
            current = self.parent(node);
        }
        ancestors
    }

    /// Nearest nestable ancestor for each axis. A free-axis ancestor serves
    /// both axes; ancestors that cannot scroll are skipped.
    pub fn resolve_parents(&self, id: NodeId) -> ParentsMap {
        let mut parents = ParentsMap::default();
        for ancestor in self.ancestors(id) {
            let Some(node) = self.nodes.get(ancestor) else {
                continue;
            };
            let Some(container) = node.container.as_ref() else {
                continue;
            };
            match container.axis() {
                Axis::Free => {
                    parents.entry(Axis::Vertical).or_insert(ancestor);
                    parents.entry(Axis::Horizontal).or_insert(ancestor);
                }
                Axis::None => {}
                axis => {
                    parents.entry(axis).or_insert(ancestor);
                }
            }
            if parents.contains_key(&Axis::Vertical) && parents.contains_key(&Axis::Horizontal) {
                break;
            }
        }
        tracing::trace!("resolved nested parents for {:?}: {:?}", id, parents);
        parents
    }

    // =========================================================================
    // Container access
    // =========================================================================

    pub fn container(&self, id: NodeId) -> Option<&dyn NestableScrollContainer> {
        self.nodes.get(id)?.container.as_deref()
    }

    pub fn container_as<T: NestableScrollContainer>(&self, id: NodeId) -> Option<&T> {
        self.container(id)?.as_any().downcast_ref::<T>()
    }

    pub fn container_as_mut<T: NestableScrollContainer>(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes
            .get_mut(id)?
            .container
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Run `f` with the container at `id` checked out of the tree. Returns
    /// None for dangling ids, plain nodes, and containers already checked out.
    pub fn with_container<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut dyn NestableScrollContainer, &mut ScrollChain<'_>) -> R,
    ) -> Option<R> {
        let node = self.nodes.get_mut(id)?;
        let Some(mut container) = node.container.take() else {
            tracing::trace!("node {:?} has no container available", id);
            return None;
        };
        let result = {
            let mut chain = ScrollChain { tree: self, node: id };
            f(container.as_mut(), &mut chain)
        };
        match self.nodes.get_mut(id) {
            Some(node) => node.container = Some(container),
            None => tracing::debug!("node {:?} removed while its container ran", id),
        }
        Some(result)
    }

    pub fn with_container_as<T: NestableScrollContainer, R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut T, &mut ScrollChain<'_>) -> R,
    ) -> Option<R> {
        self.with_container(id, |container, chain| {
            container
                .as_any_mut()
                .downcast_mut::<T>()
                .map(|container| f(container, chain))
        })
        .flatten()
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// A gesture begins on `id`
    pub fn scroll_start(&mut self, id: NodeId, position: f32) -> bool {
        self.with_container(id, |container, chain| {
            container.on_scroll_start_recursive(chain, position, 0.0)
        })
        .is_some()
    }

    /// Drag delta for `id`
    pub fn scroll_update(&mut self, id: NodeId, offset: f32, source: ScrollSource) -> bool {
        self.with_container(id, |container, chain| {
            container.on_gesture_update(chain, offset, source)
        })
        .is_some()
    }

    /// Finger lifted from `id` with `velocity`
    pub fn scroll_end(&mut self, id: NodeId, velocity: f32) -> bool {
        self.with_container(id, |container, chain| container.on_gesture_end(chain, velocity))
            .is_some()
    }

    pub fn touch_cancel(&mut self, id: NodeId) -> bool {
        self.with_container(id, |container, chain| container.on_touch_cancel(chain))
            .is_some()
    }

    /// Pump every container's animations. Returns whether anything moved.
    pub fn tick(&mut self, dt: f32) -> bool {
        let ids: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.container.is_some())
            .map(|(id, _)| id)
            .collect();
        let mut moved = false;
        for id in ids {
            moved |= self
                .with_container(id, |container, chain| container.on_tick(chain, dt))
                .unwrap_or(false);
        }
        moved
    }

    /// Route a gesture event to its target. Returns whether it was handled.
    pub fn dispatch(&mut self, event: &Event) -> bool {
        let id = NodeId::from_ffi(event.target);
        let Some(axis) = self.container(id).map(|container| container.input_axis()) else {
            tracing::debug!("dropping event {} for unknown target", event.event_type);
            return false;
        };
        let value = event.main_value(axis.is_horizontal());
        match event.event_type {
            event_types::SCROLL_START => self.scroll_start(id, value),
            event_types::DRAG => self.scroll_update(id, value, ScrollSource::Update),
            event_types::SCROLL => self.scroll_update(id, value, ScrollSource::Axis),
            event_types::DRAG_END | event_types::SCROLL_END => self.scroll_end(id, value),
            event_types::TOUCH_CANCEL => self.touch_cancel(id),
            _ => false,
        }
    }
}

// ============================================================================
// Scroll chain
// ============================================================================

/// Access to the rest of the tree while a container is checked out
pub struct ScrollChain<'a> {
    tree: &'a mut ViewTree,
    node: NodeId,
}

impl<'a> ScrollChain<'a> {
    /// The checked-out node
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn tree(&self) -> &ViewTree {
        self.tree
    }

    /// Nestable ancestors of the checked-out node
    pub fn resolve_parents(&self) -> ParentsMap {
        self.tree.resolve_parents(self.node)
    }

    pub fn kind(&self, id: NodeId) -> Option<ContainerKind> {
        self.tree.container(id).map(|container| container.kind())
    }

    pub fn nested_scroll(&self, id: NodeId) -> Option<NestedScrollOptions> {
        self.tree.container(id).map(|container| container.nested_scroll())
    }

    pub fn nested_parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.container(id)?.nested_parent()
    }

    pub fn out_of_boundary(&self, id: NodeId) -> bool {
        self.tree
            .container(id)
            .is_some_and(|container| container.nested_scroll_out_of_boundary())
    }

    pub fn handle_scroll(
        &mut self,
        id: NodeId,
        offset: f32,
        source: ScrollSource,
        state: NestedState,
        velocity: f32,
    ) -> Option<ScrollResult> {
        self.tree.with_container(id, |container, chain| {
            container.handle_scroll(chain, offset, source, state, velocity)
        })
    }

    pub fn handle_scroll_velocity(&mut self, id: NodeId, velocity: f32) -> Option<bool> {
        self.tree.with_container(id, |container, chain| {
            container.handle_scroll_velocity(chain, velocity)
        })
    }

    pub fn on_scroll_start_recursive(&mut self, id: NodeId, position: f32, velocity: f32) -> bool {
        self.tree
            .with_container(id, |container, chain| {
                container.on_scroll_start_recursive(chain, position, velocity)
            })
            .is_some()
    }

    pub fn on_scroll_end_recursive(&mut self, id: NodeId, velocity: Option<f32>) -> bool {
        self.tree
            .with_container(id, |container, chain| {
                container.on_scroll_end_recursive(chain, velocity)
            })
            .is_some()
    }

    pub fn on_scroll_drag_end_recursive(&mut self, id: NodeId) -> bool {
        self.tree
            .with_container(id, |container, chain| {
                container.on_scroll_drag_end_recursive(chain)
            })
            .is_some()
    }
}
