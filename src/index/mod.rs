pub mod tower;
pub mod trie;

pub use tower::{SearchFrame, SearchTower};
pub use trie::{NodeId, SearchTrie, TrieNode, NO_CHILD, ROOT};
