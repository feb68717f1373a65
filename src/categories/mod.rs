//! Categories
//!
//! The category tree is an arena of nodes with a parent index. Every node's ancestor chain
//! (itself first, root last) is memoised when the node is inserted or moved, so discount
//! resolution never walks parent pointers at pricing time.

use rust_decimal::Decimal;
use slotmap::{SecondaryMap, SlotMap, new_key_type};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

pub mod cache;
pub mod effective;

pub use cache::{NavigationCache, TtlCache};
pub use effective::{effective_discount, highest_effective_discount};

new_key_type! {
    /// Category Key
    pub struct CategoryKey;
}

/// Ancestor chain storage; most storefront trees are shallow.
pub type CategoryChain = SmallVec<[CategoryKey; 8]>;

/// Errors raised by tree mutations and lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    /// The category is not part of the tree.
    #[error("category {0:?} not found")]
    NotFound(CategoryKey),

    /// The requested parent would make the category its own ancestor.
    #[error("moving category {category:?} under {parent:?} would create a cycle")]
    CycleDetected {
        /// Category being moved
        category: CategoryKey,

        /// Requested parent
        parent: CategoryKey,
    },
}

/// A category node.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Display name
    pub name: String,

    /// URL slug
    pub slug: String,

    /// Percentage points this category takes off, compounded with its ancestors
    pub discount_percentage: Decimal,

    /// Sort position among siblings
    pub position: u32,
}

impl Category {
    /// Create a category without a discount.
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            discount_percentage: Decimal::ZERO,
            position: 0,
        }
    }

    /// Set the category's own discount.
    #[must_use]
    pub fn with_discount(mut self, percentage: Decimal) -> Self {
        self.discount_percentage = percentage;
        self
    }

    /// Set the sort position.
    #[must_use]
    pub fn at_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }
}

/// Category tree.
#[derive(Debug, Default)]
pub struct CategoryTree {
    nodes: SlotMap<CategoryKey, Category>,
    parents: SecondaryMap<CategoryKey, CategoryKey>,
    children: SecondaryMap<CategoryKey, SmallVec<[CategoryKey; 8]>>,
    roots: SmallVec<[CategoryKey; 8]>,
    chains: SecondaryMap<CategoryKey, CategoryChain>,
    revision: u64,
}

impl CategoryTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category under `parent`, or as a root.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::NotFound`] if `parent` is not in the tree.
    pub fn insert(
        &mut self,
        category: Category,
        parent: Option<CategoryKey>,
    ) -> Result<CategoryKey, CategoryError> {
        if let Some(parent) = parent
            && !self.nodes.contains_key(parent)
        {
            return Err(CategoryError::NotFound(parent));
        }

        let key = self.nodes.insert(category);

        self.children.insert(key, SmallVec::new());
        self.attach(key, parent);
        self.rebuild_chains(key);
        self.touch();

        Ok(key)
    }

    /// Edit a category's own fields in place.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::NotFound`] if the category is not in the tree.
    pub fn update(
        &mut self,
        key: CategoryKey,
        edit: impl FnOnce(&mut Category),
    ) -> Result<(), CategoryError> {
        let category = self.nodes.get_mut(key).ok_or(CategoryError::NotFound(key))?;

        edit(category);
        self.touch();

        Ok(())
    }

    /// Move a category (and its subtree) under a new parent, or to the root level.
    ///
    /// # Errors
    ///
    /// - [`CategoryError::NotFound`]: either category is not in the tree.
    /// - [`CategoryError::CycleDetected`]: `parent` is `key` itself or one of its descendants.
    pub fn reparent(
        &mut self,
        key: CategoryKey,
        parent: Option<CategoryKey>,
    ) -> Result<(), CategoryError> {
        if !self.nodes.contains_key(key) {
            return Err(CategoryError::NotFound(key));
        }

        if let Some(parent) = parent {
            let parent_chain = self
                .chains
                .get(parent)
                .ok_or(CategoryError::NotFound(parent))?;

            if parent_chain.contains(&key) {
                return Err(CategoryError::CycleDetected {
                    category: key,
                    parent,
                });
            }
        }

        self.detach(key);
        self.attach(key, parent);
        self.rebuild_chains(key);
        self.touch();

        debug!(?key, ?parent, "re-parented category");

        Ok(())
    }

    /// Delete a category together with its subtree.
    ///
    /// Returns the removed keys, parents before children, so callers can cascade anything the
    /// categories owned.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::NotFound`] if the category is not in the tree.
    pub fn remove(&mut self, key: CategoryKey) -> Result<Vec<CategoryKey>, CategoryError> {
        let removed = self.descendants_and_self(key)?;

        self.detach(key);

        for removed_key in &removed {
            self.nodes.remove(*removed_key);
            self.parents.remove(*removed_key);
            self.children.remove(*removed_key);
            self.chains.remove(*removed_key);
        }

        self.touch();

        Ok(removed)
    }

    /// Look up a category.
    pub fn get(&self, key: CategoryKey) -> Option<&Category> {
        self.nodes.get(key)
    }

    /// Parent of a category, `None` for roots and unknown keys.
    pub fn parent(&self, key: CategoryKey) -> Option<CategoryKey> {
        self.parents.get(key).copied()
    }

    /// Direct children in insertion order.
    pub fn children(&self, key: CategoryKey) -> &[CategoryKey] {
        self.children.get(key).map_or(&[], SmallVec::as_slice)
    }

    /// Root categories in insertion order.
    pub fn roots(&self) -> &[CategoryKey] {
        &self.roots
    }

    /// The category followed by its ancestors, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::NotFound`] if the category is not in the tree.
    pub fn ancestors_and_self(&self, key: CategoryKey) -> Result<&[CategoryKey], CategoryError> {
        self.chains
            .get(key)
            .map(SmallVec::as_slice)
            .ok_or(CategoryError::NotFound(key))
    }

    /// The category and everything below it, parents before children.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::NotFound`] if the category is not in the tree.
    pub fn descendants_and_self(&self, key: CategoryKey) -> Result<Vec<CategoryKey>, CategoryError> {
        if !self.nodes.contains_key(key) {
            return Err(CategoryError::NotFound(key));
        }

        let mut ordered = Vec::new();
        let mut stack = vec![key];

        while let Some(next) = stack.pop() {
            ordered.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }

        Ok(ordered)
    }

    /// Whether `ancestor` sits above `key` in the tree.
    pub fn is_ancestor(&self, ancestor: CategoryKey, key: CategoryKey) -> bool {
        ancestor != key
            && self
                .chains
                .get(key)
                .is_some_and(|chain| chain.contains(&ancestor))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Counter bumped by every write; caches compare it to detect staleness.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn attach(&mut self, key: CategoryKey, parent: Option<CategoryKey>) {
        if let Some(parent) = parent
            && let Some(siblings) = self.children.get_mut(parent)
        {
            siblings.push(key);
            self.parents.insert(key, parent);
        } else {
            self.roots.push(key);
        }
    }

    fn detach(&mut self, key: CategoryKey) {
        match self.parents.remove(key) {
            Some(parent) => {
                if let Some(siblings) = self.children.get_mut(parent) {
                    siblings.retain(|sibling| *sibling != key);
                }
            }
            None => self.roots.retain(|root| *root != key),
        }
    }

    fn rebuild_chains(&mut self, key: CategoryKey) {
        let mut stack = vec![key];

        while let Some(next) = stack.pop() {
            let mut chain = CategoryChain::new();
            chain.push(next);

            if let Some(parent_chain) = self.parent(next).and_then(|parent| self.chains.get(parent))
            {
                chain.extend_from_slice(parent_chain);
            }

            self.chains.insert(next, chain);
            stack.extend_from_slice(self.children(next));
        }
    }

    /// Root-first navigation tree, siblings ordered by position then name.
    pub fn navigation(&self) -> Vec<NavigationNode> {
        self.navigation_level(&self.roots)
    }

    fn navigation_level(&self, keys: &[CategoryKey]) -> Vec<NavigationNode> {
        let mut level: Vec<(&Category, CategoryKey)> = keys
            .iter()
            .filter_map(|key| self.nodes.get(*key).map(|category| (category, *key)))
            .collect();

        level.sort_by(|(a, _), (b, _)| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));

        level
            .into_iter()
            .map(|(category, key)| NavigationNode {
                key,
                name: category.name.clone(),
                slug: category.slug.clone(),
                children: self.navigation_level(self.children(key)),
            })
            .collect()
    }
}

/// A node of the storefront navigation menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationNode {
    /// Category key
    pub key: CategoryKey,

    /// Display name
    pub name: String,

    /// URL slug
    pub slug: String,

    /// Ordered children
    pub children: Vec<NavigationNode>,
}
