//! Arena-backed page tree
//!
//! Nodes live in a flat vector and refer to each other by [`NodeId`]. A node
//! owns the ordered list of its children's ids and keeps its parent's id for
//! lookup only, so the tree has no ownership cycles.

use crate::crawler::MetaTags;
use crate::state::PageStatus;
use crate::SitemapError;
use serde::Serialize;

/// Index of a node inside its [`SiteTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in creation order
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One crawled (or attempted) page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNode {
    #[serde(skip)]
    id: NodeId,
    #[serde(skip)]
    parent: Option<NodeId>,
    #[serde(skip)]
    children: Vec<NodeId>,

    /// Normalized absolute URL, unique within a crawl
    pub url: String,

    /// Best-effort display title, never empty
    pub title: String,

    /// BFS distance from the seed
    pub depth: u32,

    status: PageStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_tags: Option<MetaTags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robots_meta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_links: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_links: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h1_tags: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h2_tags: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h3_tags: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_urls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schema_types: Vec<String>,
}

impl PageNode {
    fn new(id: NodeId, parent: Option<NodeId>, url: String, title: String, depth: u32) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            url,
            title,
            depth,
            status: PageStatus::Pending,
            error: None,
            last_modified: None,
            content_type: None,
            meta_tags: None,
            canonical_url: None,
            robots_meta: None,
            language: None,
            charset: None,
            word_count: None,
            internal_links: None,
            external_links: None,
            images: None,
            h1_tags: None,
            h2_tags: None,
            h3_tags: None,
            image_urls: Vec::new(),
            external_urls: Vec::new(),
            schema_types: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn child_ids(&self) -> &[NodeId] {
        &self.children
    }

    pub fn status(&self) -> PageStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == PageStatus::Completed
    }
}

/// The result tree of one crawl, rooted at the seed page
#[derive(Debug, Clone)]
pub struct SiteTree {
    nodes: Vec<PageNode>,
}

impl SiteTree {
    /// Creates a tree holding only a pending root node at depth 0
    pub fn new(root_url: impl Into<String>, title: impl Into<String>) -> Self {
        let root = PageNode::new(NodeId(0), None, root_url.into(), title.into(), 0);
        Self { nodes: vec![root] }
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> &PageNode {
        &self.nodes[0]
    }

    /// Returns the node for an id handed out by this tree
    pub fn node(&self, id: NodeId) -> &PageNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut PageNode {
        &mut self.nodes[id.0]
    }

    /// Appends a pending child to `parent`, one level deeper than the parent
    pub fn add_child(
        &mut self,
        parent: NodeId,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes
            .push(PageNode::new(id, Some(parent), url.into(), title.into(), depth));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Moves a node to a new status, enforcing the state machine
    pub fn transition(&mut self, id: NodeId, next: PageStatus) -> Result<(), SitemapError> {
        let node = &mut self.nodes[id.0];
        if !node.status.can_transition_to(next) {
            return Err(SitemapError::InvalidTransition {
                from: node.status,
                to: next,
            });
        }
        node.status = next;
        Ok(())
    }

    /// Marks a node as failed with a message
    pub fn fail(&mut self, id: NodeId, message: impl Into<String>) -> Result<(), SitemapError> {
        self.transition(id, PageStatus::Error)?;
        self.nodes[id.0].error = Some(message.into());
        Ok(())
    }

    /// Marks the root completed once the crawl has attached anything to it
    pub(crate) fn finalize_root(&mut self) {
        let root = &mut self.nodes[0];
        if !root.children.is_empty() {
            root.status = PageStatus::Completed;
            root.error = None;
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<&PageNode> {
        self.nodes[id.0].parent_id().map(|p| &self.nodes[p.0])
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &PageNode> + '_ {
        self.nodes[id.0].children.iter().map(|c| &self.nodes[c.0])
    }

    /// Number of nodes in the tree, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates nodes in pre-order (parent before children, children in order)
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![self.root_id()],
        }
    }

    /// Iterates completed nodes in pre-order
    pub fn completed(&self) -> impl Iterator<Item = &PageNode> + '_ {
        self.iter().filter(|n| n.is_completed())
    }

    /// Nested serialization view of the subtree rooted at `id`
    pub fn view(&self, id: NodeId) -> NodeView<'_> {
        NodeView {
            node: self.node(id),
            children: self.nodes[id.0]
                .children
                .iter()
                .map(|c| self.view(*c))
                .collect(),
        }
    }
}

/// Pre-order traversal over a [`SiteTree`]
pub struct PreOrder<'a> {
    tree: &'a SiteTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a PageNode;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A node together with its nested children, as written to JSON
#[derive(Debug, Serialize)]
pub struct NodeView<'a> {
    #[serde(flatten)]
    node: &'a PageNode,
    children: Vec<NodeView<'a>>,
}
