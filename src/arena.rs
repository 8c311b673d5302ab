//! Search arena: the fixed-capacity node sequence that doubles as the
//! depth-first call stack, and the solution chains rebuilt from it.
use crate::engine::{Configuration, Move};
use crate::error::SearchError;

/// Default maximum number of nodes the arena may hold at once.
///
/// The arena only ever holds the siblings along the current path, so its
/// size is bounded by path depth times branching factor, not by the number
/// of states visited.
pub const DEFAULT_ARENA_CAPACITY: usize = 4096;

/// A configuration stored in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    pub config: Configuration,
    /// Index of the node this one was generated from; `None` for the root.
    pub parent: Option<usize>,
    /// Set once the node's children have been generated (or pruned).
    pub expanded: bool,
}

impl Node {
    pub fn root(config: Configuration) -> Self {
        Node {
            config,
            parent: None,
            expanded: false,
        }
    }

    pub fn child(config: Configuration, parent: usize) -> Self {
        Node {
            config,
            parent: Some(parent),
            expanded: false,
        }
    }
}

/// Result of one expansion attempt at the top of the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expansion {
    /// The top was already expanded and has been removed.
    Popped,
    /// The top was expanded and this many children were pushed (possibly zero).
    Expanded(usize),
    /// The arena was empty; nothing happened.
    Empty,
}

/// Ordered sequence of nodes addressed by index; the last node is the top.
///
/// A node is pushed the moment it is generated and popped only when it is
/// found at the top while already expanded, so every ancestor of the top
/// stays in place until its whole subtree has been explored.
#[derive(Clone, Debug)]
pub struct Arena {
    nodes: Vec<Node>,
    capacity: usize,
    max_len: usize,
}

impl Arena {
    /// Creates an arena holding only `root`.
    ///
    /// # Errors
    /// `SearchError::InvalidCapacity` if `capacity` is zero.
    pub fn new(root: Configuration, capacity: usize) -> Result<Self, SearchError> {
        if capacity == 0 {
            return Err(SearchError::InvalidCapacity);
        }
        let mut nodes = Vec::with_capacity(capacity);
        nodes.push(Node::root(root));
        Ok(Arena {
            nodes,
            capacity,
            max_len: 1,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Largest number of nodes held at once so far.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn top_index(&self) -> Option<usize> {
        self.nodes.len().checked_sub(1)
    }

    pub fn top(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// Pushes `node` on top, returning its index.
    ///
    /// # Errors
    /// `SearchError::ArenaOverflow` if the arena is already at capacity.
    pub fn push(&mut self, node: Node) -> Result<usize, SearchError> {
        if self.nodes.len() >= self.capacity {
            return Err(SearchError::ArenaOverflow {
                capacity: self.capacity,
            });
        }
        debug_assert!(node.parent.map_or(true, |p| p < self.nodes.len()));
        self.nodes.push(node);
        self.max_len = self.max_len.max(self.nodes.len());
        Ok(self.nodes.len() - 1)
    }

    /// Removes and returns the top node.
    pub fn pop(&mut self) -> Option<Node> {
        self.nodes.pop()
    }

    /// Marks the top node expanded without generating its children, so the
    /// next expansion attempt pops it.
    pub fn prune_top(&mut self) {
        if let Some(top) = self.nodes.last_mut() {
            top.expanded = true;
        }
    }

    /// Expands or pops the top node.
    ///
    /// An already expanded top is popped. Otherwise the top is marked
    /// expanded and one child per legal move is pushed, in generation order,
    /// each linked back to the top's index.
    ///
    /// # Errors
    /// `SearchError::ArenaOverflow` if pushing a child exceeds the capacity.
    /// The run must be abandoned in that case.
    pub fn expand_top(&mut self) -> Result<Expansion, SearchError> {
        let index = match self.top_index() {
            Some(index) => index,
            None => return Ok(Expansion::Empty),
        };

        if self.nodes[index].expanded {
            self.pop();
            return Ok(Expansion::Popped);
        }
        let top = &mut self.nodes[index];
        top.expanded = true;
        let config = top.config;

        let mut pushed = 0;
        for child in config.children() {
            self.push(Node::child(child, index))?;
            pushed += 1;
        }
        Ok(Expansion::Expanded(pushed))
    }

    /// Rebuilds the root-first path of configurations ending at `index`.
    ///
    /// The parent links are walked twice: once to count the chain length and
    /// once to fill an exactly sized sequence from the back.
    ///
    /// # Errors
    /// `SearchError::NodeOutOfRange` if `index` is not a node of this arena.
    pub fn chain_to(&self, index: usize) -> Result<SolutionChain, SearchError> {
        let node = self.nodes.get(index).ok_or(SearchError::NodeOutOfRange {
            index,
            len: self.nodes.len(),
        })?;

        let mut length = 1;
        let mut link = node.parent;
        while let Some(parent) = link {
            length += 1;
            link = self.nodes[parent].parent;
        }

        let mut configs = vec![node.config; length];
        let mut cursor = index;
        for slot in configs.iter_mut().rev() {
            let node = &self.nodes[cursor];
            *slot = node.config;
            match node.parent {
                Some(parent) => cursor = parent,
                None => break,
            }
        }
        Ok(SolutionChain::new(configs))
    }
}

/// Root-first sequence of configurations, one per move plus the start.
///
/// An empty chain means no node was ever recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SolutionChain {
    configs: Vec<Configuration>,
}

impl SolutionChain {
    pub fn new(configs: Vec<Configuration>) -> Self {
        SolutionChain { configs }
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn configurations(&self) -> &[Configuration] {
        &self.configs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Configuration> {
        self.configs.iter()
    }

    pub fn start(&self) -> Option<&Configuration> {
        self.configs.first()
    }

    pub fn last(&self) -> Option<&Configuration> {
        self.configs.last()
    }

    /// Number of moves in the chain.
    pub fn move_count(&self) -> usize {
        self.configs.len().saturating_sub(1)
    }

    /// Recovers the move joining each adjacent pair of configurations.
    ///
    /// Returns `None` if some adjacent pair is not one legal move apart, so a
    /// returned list always has exactly `move_count()` entries, with move `i`
    /// leading from configuration `i` to configuration `i + 1`.
    pub fn moves(&self) -> Option<Vec<Move>> {
        self.configs
            .windows(2)
            .map(|pair| pair[0].move_to(&pair[1]))
            .collect()
    }

    /// Returns `true` if every adjacent pair is joined by exactly one legal move.
    pub fn is_connected(&self) -> bool {
        self.configs.windows(2).all(|pair| {
            pair[0]
                .legal_moves()
                .iter()
                .filter(|mv| mv.apply(&pair[0]) == Some(pair[1]))
                .count()
                == 1
        })
    }
}

impl<'a> IntoIterator for &'a SolutionChain {
    type Item = &'a Configuration;
    type IntoIter = std::slice::Iter<'a, Configuration>;

    fn into_iter(self) -> Self::IntoIter {
        self.configs.iter()
    }
}
