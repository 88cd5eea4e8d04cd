use crate::bio::{SeqId, SequenceTable};
use crate::StarlingError;
use serde::{Deserialize, Serialize};

/// One canonical sequence and everything absorbed into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub canonical: SeqId,
    /// Canonical first, then by descending count.
    pub members: Vec<SeqId>,
    /// Sum of member counts.
    pub count: u64,
    /// Raw record ids of every member, ascending.
    pub ids: Vec<u64>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Center, total count and member sequences of one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterCenter {
    pub sequence: Vec<u8>,
    pub count: u64,
    pub members: Vec<Vec<u8>>,
}

/// Final clustering of a table. `parent[i]` is the canonical representative
/// of sequence `i` (a canonical is its own parent) and `cluster_of[i]` indexes
/// `clusters`, which are ordered by descending count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub parent: Vec<SeqId>,
    pub cluster_of: Vec<u32>,
    pub clusters: Vec<Cluster>,
}

impl ClusterAssignment {
    /// Group sequences by canonical. Every parent must itself be canonical;
    /// anything else is a chain, and chains are where cycles hide.
    pub fn from_parents(table: &SequenceTable, parent: Vec<SeqId>) -> crate::Result<Self> {
        let n = table.len();
        if parent.len() != n {
            return Err(StarlingError::InvariantViolation(format!(
                "{} parents for {} sequences",
                parent.len(),
                n
            )));
        }
        for (child, &p) in parent.iter().enumerate() {
            if p as usize >= n || parent[p as usize] != p {
                debug_assert!(false, "sequence {} has non-canonical parent {}", child, p);
                return Err(StarlingError::InvariantViolation(format!(
                    "sequence {} has parent {} which is not canonical",
                    child, p
                )));
            }
        }

        let mut clusters: Vec<Cluster> = Vec::new();
        let mut slot_of_canonical = vec![u32::MAX; n];
        for id in table.ranked_ids() {
            let canonical = parent[id as usize];
            let slot = &mut slot_of_canonical[canonical as usize];
            if *slot == u32::MAX {
                *slot = clusters.len() as u32;
                clusters.push(Cluster {
                    canonical,
                    members: vec![canonical],
                    count: 0,
                    ids: Vec::new(),
                });
            }
            let cluster = &mut clusters[*slot as usize];
            if id != canonical {
                cluster.members.push(id);
            }
            let entry = table.get(id);
            cluster.count += entry.count;
            cluster.ids.extend_from_slice(&entry.ids);
        }

        for cluster in &mut clusters {
            cluster.ids.sort_unstable();
        }
        clusters.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.canonical.cmp(&b.canonical))
        });

        let mut cluster_of = vec![0u32; n];
        for (index, cluster) in clusters.iter().enumerate() {
            for &member in &cluster.members {
                cluster_of[member as usize] = index as u32;
            }
        }

        Ok(Self {
            parent,
            cluster_of,
            clusters,
        })
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn canonical_of(&self, id: SeqId) -> SeqId {
        self.parent[id as usize]
    }

    pub fn cluster_for(&self, id: SeqId) -> &Cluster {
        &self.clusters[self.cluster_of[id as usize] as usize]
    }

    pub fn same_cluster(&self, a: SeqId, b: SeqId) -> bool {
        self.parent[a as usize] == self.parent[b as usize]
    }

    /// Check that every sequence sits in exactly one cluster whose canonical
    /// is its parent.
    pub fn validate(&self, table: &SequenceTable) -> crate::Result<()> {
        let mut seen = vec![false; table.len()];
        for (index, cluster) in self.clusters.iter().enumerate() {
            if cluster.members.first() != Some(&cluster.canonical) {
                return Err(StarlingError::InvariantViolation(format!(
                    "cluster {} does not list its canonical first",
                    index
                )));
            }
            for &member in &cluster.members {
                let m = member as usize;
                if std::mem::replace(&mut seen[m], true) {
                    return Err(StarlingError::InvariantViolation(format!(
                        "sequence {} appears in more than one cluster",
                        member
                    )));
                }
                if self.parent[m] != cluster.canonical || self.cluster_of[m] as usize != index {
                    return Err(StarlingError::InvariantViolation(format!(
                        "sequence {} disagrees with its cluster {}",
                        member, index
                    )));
                }
            }
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(StarlingError::InvariantViolation(format!(
                "sequence {} is in no cluster",
                missing
            )));
        }
        Ok(())
    }

    /// Clusters as sequences, in output order.
    pub fn centers(&self, table: &SequenceTable) -> Vec<ClusterCenter> {
        self.clusters
            .iter()
            .map(|cluster| ClusterCenter {
                sequence: table.get(cluster.canonical).sequence.clone(),
                count: cluster.count,
                members: cluster
                    .members
                    .iter()
                    .map(|&m| table.get(m).sequence.clone())
                    .collect(),
            })
            .collect()
    }
}
