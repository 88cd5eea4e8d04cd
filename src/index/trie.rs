/// Prefix tree over the unique sequences of a table
///
/// Nodes live in one arena addressed by `NodeId`; child slots are stored in a
/// flat array of `alphabet.len()` entries per node. Nodes are only created
/// along inserted paths, so every leaf carries a terminal sequence.
use crate::bio::{Alphabet, SeqId, SequenceTable};
use crate::core::config::Metric;
use crate::StarlingError;

pub type NodeId = u32;

pub const ROOT: NodeId = 0;
pub const NO_CHILD: NodeId = NodeId::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrieNode {
    /// Sequence whose last symbol ends here.
    pub terminal: Option<SeqId>,
    /// Path length from the root.
    pub depth: u32,
    /// Deepest terminal in the subtree, relative to this node.
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct SearchTrie {
    alphabet: Alphabet,
    metric: Metric,
    nodes: Vec<TrieNode>,
    children: Vec<NodeId>,
    sequence_count: usize,
}

impl SearchTrie {
    pub fn build(table: &SequenceTable, alphabet: &Alphabet, metric: Metric) -> crate::Result<Self> {
        if metric == Metric::Hamming {
            check_fixed_length(table)?;
        }

        let mut trie = Self {
            alphabet: alphabet.clone(),
            metric,
            nodes: Vec::new(),
            children: Vec::new(),
            sequence_count: table.len(),
        };
        trie.push_node(0)?;

        let width = alphabet.len();
        let mut codes = Vec::new();
        for (id, entry) in table.iter() {
            alphabet.encode_into(&entry.sequence, &mut codes)?;

            let mut node = ROOT;
            for (depth, &code) in codes.iter().enumerate() {
                let slot = node as usize * width + code as usize;
                node = match trie.children[slot] {
                    NO_CHILD => {
                        let created = trie.push_node(depth as u32 + 1)?;
                        trie.children[slot] = created;
                        created
                    }
                    existing => existing,
                };
            }

            let terminal = &mut trie.nodes[node as usize].terminal;
            if terminal.is_some() {
                return Err(StarlingError::InvariantViolation(format!(
                    "sequence {} inserted twice",
                    entry.to_string()
                )));
            }
            *terminal = Some(id);
        }

        trie.compute_heights();

        tracing::debug!(
            "Trie built: {} nodes for {} sequences, max depth {}",
            trie.nodes.len(),
            trie.sequence_count,
            trie.max_depth()
        );
        Ok(trie)
    }

    fn push_node(&mut self, depth: u32) -> crate::Result<NodeId> {
        if self.nodes.len() >= NO_CHILD as usize {
            return Err(StarlingError::Resource(
                "trie node arena exhausted".to_string(),
            ));
        }
        self.nodes.try_reserve(1)?;
        self.children.try_reserve(self.alphabet.len())?;

        let id = self.nodes.len() as NodeId;
        self.nodes.push(TrieNode {
            terminal: None,
            depth,
            height: 0,
        });
        self.children
            .extend(std::iter::repeat(NO_CHILD).take(self.alphabet.len()));
        Ok(id)
    }

    /// Children are always allocated after their parent, so one reverse sweep
    /// sees every child before the node itself.
    fn compute_heights(&mut self) {
        let width = self.alphabet.len();
        for index in (0..self.nodes.len()).rev() {
            let height = self.children[index * width..(index + 1) * width]
                .iter()
                .filter(|&&child| child != NO_CHILD)
                .map(|&child| self.nodes[child as usize].height + 1)
                .max()
                .unwrap_or(0);
            self.nodes[index].height = height;
        }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id as usize]
    }

    pub fn child(&self, id: NodeId, code: u8) -> Option<NodeId> {
        match self.children[id as usize * self.alphabet.len() + code as usize] {
            NO_CHILD => None,
            child => Some(child),
        }
    }

    /// Child slots of `id` in alphabet order, `NO_CHILD` where empty.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        let width = self.alphabet.len();
        &self.children[id as usize * width..(id as usize + 1) * width]
    }

    pub fn terminal(&self, id: NodeId) -> Option<SeqId> {
        self.nodes[id as usize].terminal
    }

    pub fn max_depth(&self) -> usize {
        self.nodes[ROOT as usize].height as usize
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence_count == 0
    }

    pub fn sequence_count(&self) -> usize {
        self.sequence_count
    }

    /// Exact lookup of an encoded sequence.
    pub fn lookup(&self, codes: &[u8]) -> Option<SeqId> {
        let mut node = ROOT;
        for &code in codes {
            node = self.child(node, code)?;
        }
        self.terminal(node)
    }
}

fn check_fixed_length(table: &SequenceTable) -> crate::Result<()> {
    let mut lengths = table.entries().iter().map(|e| e.len());
    if let Some(first) = lengths.next() {
        if let Some(other) = lengths.find(|&len| len != first) {
            return Err(StarlingError::Config(format!(
                "hamming distance needs fixed-length sequences, found lengths {} and {}",
                first, other
            )));
        }
    }
    Ok(())
}
