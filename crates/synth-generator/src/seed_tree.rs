//! Hierarchical, path-addressed random streams.
//!
//! A [`SeedNode`] is an immutable list of labels below a root seed. Every
//! node can hand out a conventional PRNG seeded from a hash of its whole
//! path, so nested structures (table → field → item) get stable and
//! independent randomness no matter in which order they are built.
//!
//! ```text
//! root(42)
//!   ├── "users"
//!   │     ├── "email"      → StdRng
//!   │     └── "activity"
//!   │            ├── 0     → StdRng
//!   │            └── 1     → StdRng
//!   └── "orders" ...
//! ```
//!
//! A node shares its ancestors' labels through an immutable `Arc` chain, so
//! `child` is O(1), nodes are `Send + Sync`, and they can be cloned or
//! serialized freely. A PRNG obtained from a node is an ordinary owned value
//! and must be driven by a single stream.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One step in a seed path.
///
/// Names and indices hash under different tags, so `"1"` and `1` at the same
/// level address different streams.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeedLabel {
    /// Named component
    Name(String),
    /// Indexed component
    Index(u64),
}

impl From<&str> for SeedLabel {
    fn from(s: &str) -> Self {
        Self::Name(s.to_string())
    }
}

impl From<String> for SeedLabel {
    fn from(s: String) -> Self {
        Self::Name(s)
    }
}

impl From<u64> for SeedLabel {
    fn from(i: u64) -> Self {
        Self::Index(i)
    }
}

impl From<usize> for SeedLabel {
    fn from(i: usize) -> Self {
        Self::Index(i as u64)
    }
}

/// Root of a tree of random streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchicalSeedTree {
    seed: u64,
}

impl HierarchicalSeedTree {
    /// Create a tree with the given root seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// The root seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The root node (empty path).
    pub fn root(&self) -> SeedNode {
        SeedNode {
            root_seed: self.seed,
            depth: 0,
            leaf: None,
        }
    }

    /// Shorthand for `root().child(label)`.
    pub fn child(&self, label: impl Into<SeedLabel>) -> SeedNode {
        self.root().child(label)
    }

    /// PRNG for `node`. Equivalent to `node.random_generator()`.
    pub fn random_generator(&self, node: &SeedNode) -> StdRng {
        node.random_generator()
    }

    /// Indexed children of `node`. Equivalent to `node.iterate()`.
    pub fn iterate(&self, node: &SeedNode) -> Children {
        node.iterate()
    }
}

/// One label and the chain above it.
#[derive(Debug)]
struct Link {
    label: SeedLabel,
    parent: Option<Arc<Link>>,
}

/// An addressable position in the tree. Equality is by root seed and path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SeedPath", into = "SeedPath")]
pub struct SeedNode {
    root_seed: u64,
    depth: usize,
    leaf: Option<Arc<Link>>,
}

/// Serialized form of a [`SeedNode`].
#[derive(Serialize, Deserialize)]
struct SeedPath {
    root_seed: u64,
    path: Vec<SeedLabel>,
}

impl From<SeedPath> for SeedNode {
    fn from(p: SeedPath) -> Self {
        p.path
            .into_iter()
            .fold(HierarchicalSeedTree::new(p.root_seed).root(), |node, label| {
                node.child(label)
            })
    }
}

impl From<SeedNode> for SeedPath {
    fn from(node: SeedNode) -> Self {
        Self {
            root_seed: node.root_seed,
            path: node.path(),
        }
    }
}

impl PartialEq for SeedNode {
    fn eq(&self, other: &Self) -> bool {
        self.root_seed == other.root_seed
            && self.depth == other.depth
            && self.labels_to_root().eq(other.labels_to_root())
    }
}

impl Eq for SeedNode {}

impl Hash for SeedNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root_seed.hash(state);
        self.depth.hash(state);
        for label in self.labels_to_root() {
            label.hash(state);
        }
    }
}

impl SeedNode {
    /// A new node one level below this one. O(1): the parent's chain is shared.
    pub fn child(&self, label: impl Into<SeedLabel>) -> SeedNode {
        SeedNode {
            root_seed: self.root_seed,
            depth: self.depth + 1,
            leaf: Some(Arc::new(Link {
                label: label.into(),
                parent: self.leaf.clone(),
            })),
        }
    }

    /// Labels from the root down to this node.
    pub fn path(&self) -> Vec<SeedLabel> {
        let mut path: Vec<SeedLabel> = self.labels_to_root().cloned().collect();
        path.reverse();
        path
    }

    /// Number of labels below the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Seed of the tree this node belongs to.
    pub fn root_seed(&self) -> u64 {
        self.root_seed
    }

    fn labels_to_root(&self) -> impl Iterator<Item = &SeedLabel> + '_ {
        std::iter::successors(self.leaf.as_deref(), |link| link.parent.as_deref())
            .map(|link| &link.label)
    }

    /// 64-bit seed derived from the full path.
    ///
    /// Labels are fed root to leaf into BLAKE3, each with a type tag and
    /// strings with a length prefix; the first 128 bits of the digest are
    /// kept and truncated to 64.
    pub fn derived_seed(&self) -> u64 {
        let mut labels: Vec<&SeedLabel> = self.labels_to_root().collect();
        labels.reverse();

        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.root_seed.to_le_bytes());
        for label in labels {
            match label {
                SeedLabel::Name(name) => {
                    hasher.update(&[0u8]);
                    hasher.update(&(name.len() as u64).to_le_bytes());
                    hasher.update(name.as_bytes());
                }
                SeedLabel::Index(i) => {
                    hasher.update(&[1u8]);
                    hasher.update(&i.to_le_bytes());
                }
            }
        }

        let digest = hasher.finalize();
        let mut wide = [0u8; 16];
        wide.copy_from_slice(&digest.as_bytes()[..16]);
        u128::from_le_bytes(wide) as u64
    }

    /// A fresh PRNG seeded from this node's path.
    pub fn random_generator(&self) -> StdRng {
        StdRng::seed_from_u64(self.derived_seed())
    }

    /// Infinite iterator over `child(0)`, `child(1)`, ...
    ///
    /// Every call starts again at index 0.
    pub fn iterate(&self) -> Children {
        Children {
            parent: self.clone(),
            next: 0,
        }
    }
}

/// Iterator returned by [`SeedNode::iterate`].
#[derive(Debug, Clone)]
pub struct Children {
    parent: SeedNode,
    next: u64,
}

impl Iterator for Children {
    type Item = SeedNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.parent.child(self.next);
        self.next = self.next.wrapping_add(1);
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}
