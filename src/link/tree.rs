//
//  tree.rs
//  Lineage
//
//  Created by hak (tharun)
//

use super::types::ColumnLink;

/// A column lineage link together with its already-resolved further hops.
///
/// The stored link never carries `children`; they live in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTree {
    Leaf(ColumnLink),
    Node(ColumnLink, Vec<LinkTree>),
}

/// Callbacks for a depth-first walk over a [`LinkTree`].
///
/// `depth` is 1 for a top-level link.
pub trait LinkVisitor {
    fn enter(&mut self, link: &ColumnLink, depth: usize);

    fn leave(&mut self, _link: &ColumnLink, _depth: usize) {}
}

impl LinkTree {
    /// Convert a payload link, moving its nested `children` into the tree.
    pub fn from_link(mut link: ColumnLink) -> Self {
        let children = std::mem::take(&mut link.children);
        if children.is_empty() {
            LinkTree::Leaf(link)
        } else {
            LinkTree::Node(link, children.into_iter().map(LinkTree::from_link).collect())
        }
    }

    pub fn forest(links: &[ColumnLink]) -> Vec<LinkTree> {
        links.iter().cloned().map(LinkTree::from_link).collect()
    }

    pub fn link(&self) -> &ColumnLink {
        match self {
            LinkTree::Leaf(link) | LinkTree::Node(link, _) => link,
        }
    }

    pub fn children(&self) -> &[LinkTree] {
        match self {
            LinkTree::Leaf(_) => &[],
            LinkTree::Node(_, children) => children,
        }
    }

    /// Every child is visited whether or not the visitor acted on its parent.
    pub fn walk<V: LinkVisitor + ?Sized>(&self, visitor: &mut V) {
        self.walk_at(visitor, 1);
    }

    fn walk_at<V: LinkVisitor + ?Sized>(&self, visitor: &mut V, depth: usize) {
        visitor.enter(self.link(), depth);
        for child in self.children() {
            child.walk_at(visitor, depth + 1);
        }
        visitor.leave(self.link(), depth);
    }

    /// Number of links in this tree.
    pub fn link_count(&self) -> usize {
        1 + self.children().iter().map(LinkTree::link_count).sum::<usize>()
    }
}
