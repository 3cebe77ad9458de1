// Site map index: hosts and raw path segments arranged as a tree, where every
// node accumulates the records whose path passes through it.

use crate::error::SkipReason;
use crate::model::{RawRecord, RecordId, SourceEntry};
use crate::normalize::split_host_path;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::{debug, info, warn};

/// Label of the synthetic node above all hosts
pub const ROOT_LABEL: &str = "Site Map";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

#[derive(Debug)]
struct PathNode {
    label: String,
    parent: Option<NodeId>,
    children: BTreeMap<String, NodeId>,
    records: Vec<RecordId>,
}

impl PathNode {
    fn new(label: &str, parent: Option<NodeId>) -> Self {
        Self {
            label: label.to_string(),
            parent,
            children: BTreeMap::new(),
            records: Vec::new(),
        }
    }

    fn add_record(&mut self, id: RecordId) {
        // A record's visits to one node are contiguous, so the tail check is
        // enough to keep set semantics
        if self.records.last() != Some(&id) {
            self.records.push(id);
        }
    }
}

/// An entry left out of the index, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub id: RecordId,
    pub url: String,
    pub reason: SkipReason,
}

/// Outcome of one build pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub entries: usize,
    pub indexed: usize,
    pub hosts: usize,
    pub skipped: Vec<SkippedEntry>,
}

impl BuildReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// A host plus an ordered list of path segments naming one tree node.
///
/// The string form is `host/seg1/seg2`. Hosts may carry a scheme
/// (`https://api.example.com/users`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prefix {
    pub host: String,
    pub segments: Vec<String>,
}

impl Prefix {
    pub fn new(host: impl Into<String>, segments: Vec<String>) -> Self {
        Self {
            host: host.into(),
            segments,
        }
    }

    /// Parse the string form. Empty or host-less input yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let (host, path) = split_host_path(s.trim()).ok()?;
        let segments = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Some(Self::new(host, segments))
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.host)?;
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Immutable site map built from one snapshot of captured requests
#[derive(Debug)]
pub struct SiteIndex {
    nodes: Vec<PathNode>,
    records: Vec<RawRecord>,
}

impl Default for SiteIndex {
    fn default() -> Self {
        Self::empty()
    }
}

fn parse_entry(id: RecordId, entry: SourceEntry) -> Result<RawRecord, SkippedEntry> {
    let entry = match entry {
        SourceEntry::Request(entry) => entry,
        SourceEntry::Invalid { raw, detail } => {
            debug!("Entry {} could not be decoded: {}", id, detail);
            return Err(SkippedEntry {
                id,
                url: raw,
                reason: SkipReason::InvalidEntry,
            });
        }
    };

    let (host, path) = match split_host_path(&entry.url) {
        Ok((host, path)) => (host.to_string(), path.to_string()),
        Err(reason) => {
            return Err(SkippedEntry {
                id,
                url: entry.url,
                reason,
            });
        }
    };

    Ok(RawRecord {
        id,
        url: entry.url,
        host,
        path,
        method: entry.method,
        has_body: entry.has_body,
    })
}

impl SiteIndex {
    /// An index with only the root node
    pub fn empty() -> Self {
        Self {
            nodes: vec![PathNode::new(ROOT_LABEL, None)],
            records: Vec::new(),
        }
    }

    /// Build a fresh index from a source snapshot.
    ///
    /// Entries that did not decode, or whose URL cannot be split into host
    /// and path, are skipped and reported; they never abort the build.
    pub fn build<E: Into<SourceEntry>>(entries: Vec<E>) -> (Self, BuildReport) {
        let mut report = BuildReport {
            entries: entries.len(),
            ..Default::default()
        };

        let mut records = Vec::with_capacity(entries.len());
        for (position, entry) in entries.into_iter().enumerate() {
            match parse_entry(RecordId(position), entry.into()) {
                Ok(record) => records.push(record),
                Err(skipped) => {
                    warn!(
                        "Skipping entry {} ({:?}): {}",
                        skipped.id, skipped.url, skipped.reason
                    );
                    report.skipped.push(skipped);
                }
            }
        }

        let mut by_host: BTreeMap<&str, Vec<&RawRecord>> = BTreeMap::new();
        for record in &records {
            by_host.entry(record.host.as_str()).or_default().push(record);
        }

        let mut nodes = vec![PathNode::new(ROOT_LABEL, None)];
        report.hosts = by_host.len();

        for (host, mut host_records) in by_host {
            host_records.sort_by(|a, b| a.path.cmp(&b.path).then(a.id.cmp(&b.id)));
            debug!("Indexing {} records for {}", host_records.len(), host);

            let host_node = Self::child_or_insert(&mut nodes, ROOT, host);
            for record in host_records {
                nodes[ROOT.0].add_record(record.id);
                nodes[host_node.0].add_record(record.id);

                let mut current = host_node;
                for segment in record.path.split('/').filter(|s| !s.is_empty()) {
                    current = Self::child_or_insert(&mut nodes, current, segment);
                    nodes[current.0].add_record(record.id);
                }
            }
        }

        report.indexed = records.len();
        info!(
            "Site map built: {} hosts, {} records, {} skipped",
            report.hosts,
            report.indexed,
            report.skipped_count()
        );

        (Self { nodes, records }, report)
    }

    fn child_or_insert(nodes: &mut Vec<PathNode>, parent: NodeId, label: &str) -> NodeId {
        if let Some(&existing) = nodes[parent.0].children.get(label) {
            return existing;
        }

        let id = NodeId(nodes.len());
        nodes.push(PathNode::new(label, Some(parent)));
        nodes[parent.0].children.insert(label.to_string(), id);
        id
    }

    pub fn root(&self) -> NodeView<'_> {
        self.view(ROOT)
    }

    /// Host nodes in lexicographic order
    pub fn hosts(&self) -> impl Iterator<Item = NodeView<'_>> {
        self.root().children()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every indexed record, in source order
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&RawRecord> {
        self.records
            .binary_search_by_key(&id, |record| record.id)
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// Descend from the root along the prefix's host and segment labels
    pub fn find(&self, prefix: &Prefix) -> Option<NodeView<'_>> {
        prefix
            .segments
            .iter()
            .try_fold(self.root().child(&prefix.host)?, |node, segment| {
                node.child(segment)
            })
    }

    /// Union of the record sets of every selected node.
    ///
    /// A record reachable through several prefixes appears once, at its
    /// first occurrence. Prefixes naming no node contribute nothing.
    pub fn query(&self, prefixes: &[Prefix]) -> Vec<&RawRecord> {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();

        for prefix in prefixes {
            let Some(node) = self.find(prefix) else {
                debug!("No site map node for prefix {}", prefix);
                continue;
            };

            for &id in node.record_ids() {
                if seen.insert(id)
                    && let Some(record) = self.record(id)
                {
                    selected.push(record);
                }
            }
        }

        selected
    }

    /// `query` over prefixes in their string form; unparsable ones are ignored
    pub fn query_str<S: AsRef<str>>(&self, prefixes: &[S]) -> Vec<&RawRecord> {
        let parsed: Vec<Prefix> = prefixes
            .iter()
            .filter_map(|prefix| Prefix::parse(prefix.as_ref()))
            .collect();
        self.query(&parsed)
    }

    /// Indented text rendering of the whole tree with per-node record counts
    pub fn render_tree(&self) -> String {
        let root = self.root();
        let mut out = format!("{} ({})\n", root.label(), root.record_count());

        if self.records.is_empty() {
            out.push_str("  (empty)\n");
            return out;
        }

        render_children(root, "", &mut out);
        out
    }

    fn view(&self, id: NodeId) -> NodeView<'_> {
        NodeView { index: self, id }
    }
}

fn render_children(node: NodeView<'_>, indent: &str, out: &mut String) {
    let children: Vec<NodeView<'_>> = node.children().collect();
    let last = children.len().saturating_sub(1);

    for (i, child) in children.into_iter().enumerate() {
        let (branch, continuation) = if i == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        out.push_str(&format!(
            "{}{}{} ({})\n",
            indent,
            branch,
            child.label(),
            child.record_count()
        ));
        render_children(child, &format!("{}{}", indent, continuation), out);
    }
}

/// Read-only handle on one site map node
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    index: &'a SiteIndex,
    id: NodeId,
}

impl<'a> NodeView<'a> {
    fn node(&self) -> &'a PathNode {
        &self.index.nodes[self.id.0]
    }

    pub fn label(&self) -> &'a str {
        &self.node().label
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT
    }

    /// Children in lexicographic label order
    pub fn children(self) -> impl Iterator<Item = NodeView<'a>> + 'a {
        let index = self.index;
        self.node()
            .children
            .values()
            .map(move |&id| NodeView { index, id })
    }

    pub fn child(&self, label: &str) -> Option<NodeView<'a>> {
        self.node()
            .children
            .get(label)
            .map(|&id| self.index.view(id))
    }

    pub fn record_ids(&self) -> &'a [RecordId] {
        &self.node().records
    }

    pub fn records(self) -> impl Iterator<Item = &'a RawRecord> + 'a {
        let index = self.index;
        self.record_ids()
            .iter()
            .filter_map(move |&id| index.record(id))
    }

    pub fn record_count(&self) -> usize {
        self.node().records.len()
    }

    /// String form of the prefix naming this node; empty for the root
    pub fn prefix(&self) -> String {
        let mut labels = Vec::new();
        let mut current = Some(self.id);

        while let Some(id) = current {
            if id == ROOT {
                break;
            }
            let node = &self.index.nodes[id.0];
            labels.push(node.label.as_str());
            current = node.parent;
        }

        labels.reverse();
        labels.join("/")
    }
}

impl fmt::Debug for NodeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeView")
            .field("label", &self.label())
            .field("records", &self.record_count())
            .finish()
    }
}
