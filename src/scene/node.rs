//! The node trait and the plain container node.

use std::any::type_name;

use log::trace;

use super::context::TraversalContext;
use crate::error::SceneError;

/// A scene graph node.
///
/// Nodes own their children. A visit enters the node, visits the children in
/// order and exits again; state pushed by `enter` must be popped by `exit`.
pub trait Node {
    /// Pushes this node's state. On error the node is not exited and anything
    /// it pushed is unwound by the enclosing scope.
    fn enter(&mut self, _ctx: &mut TraversalContext<'_>) -> Result<(), SceneError> {
        Ok(())
    }

    fn exit(&mut self, _ctx: &mut TraversalContext<'_>) {}

    fn children(&self) -> &[Box<dyn Node>];

    fn children_mut(&mut self) -> &mut Vec<Box<dyn Node>>;

    fn append(&mut self, child: Box<dyn Node>) {
        self.children_mut().push(child);
    }

    /// Enter, visit children, exit. Stops at the first failing child and
    /// returns its error after exiting. A node whose `exit` does not pop
    /// exactly what its `enter` pushed fails with
    /// [`SceneError::UnbalancedTraversal`]; the scope is unwound either way.
    fn visit(&mut self, ctx: &mut TraversalContext<'_>) -> Result<(), SceneError> {
        trace!("visit {}", type_name::<Self>());
        let mut scope = ctx.scope();
        self.enter(&mut scope)?;
        let mut result = Ok(());
        for child in self.children_mut().iter_mut() {
            result = child.visit(&mut scope);
            if result.is_err() {
                break;
            }
        }
        self.exit(&mut scope);
        result?;
        match scope.unbalanced() {
            0 => Ok(()),
            open => Err(SceneError::UnbalancedTraversal(open)),
        }
    }
}

/// Implements the child accessors for a node with a `children` field.
macro_rules! impl_children {
    () => {
        fn children(&self) -> &[Box<dyn $crate::scene::Node>] {
            &self.children
        }

        fn children_mut(&mut self) -> &mut Vec<Box<dyn $crate::scene::Node>> {
            &mut self.children
        }
    };
}
pub(crate) use impl_children;

/// Plain container; its visit only visits the children.
#[derive(Default)]
pub struct Group {
    children: Vec<Box<dyn Node>>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(children: Vec<Box<dyn Node>>) -> Self {
        Self { children }
    }
}

impl Node for Group {
    impl_children!();
}
