//! Canonical in-memory model of one ego network
//!
//! An [`EgoNetwork`] is built once per imported file-set, handed to every
//! store read-only, and dropped after the write phase. Features always travel
//! as a [`FeatureKey`] (group plus name): the same name may legally appear in
//! several groups, so no store is ever asked to recover a group from a bare
//! name.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::warn;

/// A feature identified by its group and its name within that group
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureKey {
    pub group: String,
    pub name: String,
}

impl FeatureKey {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// Directed follow edge between two users of the same ego network
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub src: String,
    pub dst: String,
}

impl Edge {
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
        }
    }
}

/// A named circle and its members, in file order
///
/// Members are kept exactly as listed, duplicates included; stores collapse
/// duplicates through their upsert semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub name: String,
    pub members: Vec<String>,
}

/// Node variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Ego,
    User,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Ego => "ego",
            NodeKind::User => "user",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature vocabulary of one ego network: bit position -> feature
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureVocabulary {
    entries: BTreeMap<usize, FeatureKey>,
}

impl FeatureVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a feature at `index`, returning the previous entry if any
    pub fn insert(&mut self, index: usize, key: FeatureKey) -> Option<FeatureKey> {
        self.entries.insert(index, key)
    }

    pub fn get(&self, index: usize) -> Option<&FeatureKey> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FeatureKey)> {
        self.entries.iter().map(|(idx, key)| (*idx, key))
    }
}

impl FromIterator<(usize, FeatureKey)> for FeatureVocabulary {
    fn from_iter<I: IntoIterator<Item = (usize, FeatureKey)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// References dropped while building an [`EgoNetwork`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Edges with an endpoint that is not a known user
    pub dangling_edges: usize,
    /// Circle members that are not known users
    pub dangling_memberships: usize,
    /// Feature assignments that are not in the vocabulary
    pub unknown_features: usize,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.dangling_edges == 0 && self.dangling_memberships == 0 && self.unknown_features == 0
    }
}

/// Immutable canonical model of one ego network
///
/// Known users are exactly the nodes listed in the node-feature file. Every
/// edge endpoint, circle member and feature assignment held by the model
/// resolves to a known user or vocabulary entry, so a store that writes the
/// model in dependency order never produces a dangling reference.
#[derive(Debug, Clone, PartialEq)]
pub struct EgoNetwork {
    ego_id: String,
    vocabulary: FeatureVocabulary,
    node_features: BTreeMap<String, Vec<FeatureKey>>,
    ego_features: Option<Vec<FeatureKey>>,
    edges: Vec<Edge>,
    circles: Vec<Circle>,
    report: ValidationReport,
}

impl EgoNetwork {
    pub fn builder(ego_id: impl Into<String>) -> EgoNetworkBuilder {
        EgoNetworkBuilder::new(ego_id)
    }

    pub fn ego_id(&self) -> &str {
        &self.ego_id
    }

    pub fn vocabulary(&self) -> &FeatureVocabulary {
        &self.vocabulary
    }

    /// Known user ids, sorted
    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.node_features.keys().map(String::as_str)
    }

    pub fn user_count(&self) -> usize {
        self.node_features.len()
    }

    pub fn is_user(&self, id: &str) -> bool {
        self.node_features.contains_key(id)
    }

    /// Active features per user
    pub fn node_features(&self) -> impl Iterator<Item = (&str, &[FeatureKey])> {
        self.node_features
            .iter()
            .map(|(id, feats)| (id.as_str(), feats.as_slice()))
    }

    /// The ego's own features, when an `.egofeat` record exists
    pub fn ego_features(&self) -> Option<&[FeatureKey]> {
        self.ego_features.as_deref()
    }

    /// Every (node, kind, feature) assignment: users first, then the ego
    pub fn feature_assignments(&self) -> impl Iterator<Item = (&str, NodeKind, &FeatureKey)> {
        let users = self
            .node_features
            .iter()
            .flat_map(|(id, feats)| feats.iter().map(move |f| (id.as_str(), NodeKind::User, f)));
        let ego = self
            .ego_features
            .iter()
            .flatten()
            .map(move |f| (self.ego_id.as_str(), NodeKind::Ego, f));
        users.chain(ego)
    }

    /// Distinct feature group names in vocabulary order
    pub fn feature_groups(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.vocabulary
            .iter()
            .map(|(_, key)| key.group.as_str())
            .filter(|group| seen.insert(*group))
            .collect()
    }

    /// Distinct features in vocabulary order
    pub fn features(&self) -> Vec<&FeatureKey> {
        let mut seen = HashSet::new();
        self.vocabulary
            .iter()
            .map(|(_, key)| key)
            .filter(|key| seen.insert(*key))
            .collect()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    /// Every (circle name, member id) pair in file order
    pub fn memberships(&self) -> impl Iterator<Item = (&str, &str)> {
        self.circles.iter().flat_map(|circle| {
            circle
                .members
                .iter()
                .map(move |member| (circle.name.as_str(), member.as_str()))
        })
    }

    /// References dropped while the model was built
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }
}

/// Builder for [`EgoNetwork`]; `build` resolves and filters references
#[derive(Debug, Clone)]
pub struct EgoNetworkBuilder {
    ego_id: String,
    vocabulary: FeatureVocabulary,
    node_features: BTreeMap<String, Vec<FeatureKey>>,
    ego_features: Option<Vec<FeatureKey>>,
    edges: Vec<Edge>,
    circles: Vec<Circle>,
}

impl EgoNetworkBuilder {
    pub fn new(ego_id: impl Into<String>) -> Self {
        Self {
            ego_id: ego_id.into(),
            vocabulary: FeatureVocabulary::new(),
            node_features: BTreeMap::new(),
            ego_features: None,
            edges: Vec::new(),
            circles: Vec::new(),
        }
    }

    pub fn vocabulary(mut self, vocabulary: FeatureVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Replace the node-feature map; its keys become the known users
    pub fn node_features(mut self, node_features: BTreeMap<String, Vec<FeatureKey>>) -> Self {
        self.node_features = node_features;
        self
    }

    /// Add (or replace) one user and its features
    pub fn user(mut self, id: impl Into<String>, features: Vec<FeatureKey>) -> Self {
        self.node_features.insert(id.into(), features);
        self
    }

    pub fn ego_features(mut self, features: Vec<FeatureKey>) -> Self {
        self.ego_features = Some(features);
        self
    }

    pub fn edges(mut self, edges: Vec<Edge>) -> Self {
        self.edges = edges;
        self
    }

    pub fn circles(mut self, circles: Vec<Circle>) -> Self {
        self.circles = circles;
        self
    }

    pub fn build(self) -> EgoNetwork {
        let Self {
            ego_id,
            vocabulary,
            mut node_features,
            mut ego_features,
            mut edges,
            mut circles,
        } = self;

        let mut report = ValidationReport::default();
        let known: HashSet<&FeatureKey> = vocabulary.iter().map(|(_, key)| key).collect();
        for features in node_features.values_mut().chain(ego_features.iter_mut()) {
            report.unknown_features += retain_known_features(features, &known);
        }

        let before = edges.len();
        edges.retain(|e| node_features.contains_key(&e.src) && node_features.contains_key(&e.dst));
        report.dangling_edges = before - edges.len();

        for circle in circles.iter_mut() {
            let before = circle.members.len();
            circle.members.retain(|m| node_features.contains_key(m));
            report.dangling_memberships += before - circle.members.len();
        }

        if !report.is_clean() {
            warn!(
                ego_id = %ego_id,
                dangling_edges = report.dangling_edges,
                dangling_memberships = report.dangling_memberships,
                unknown_features = report.unknown_features,
                "Dropped unresolved references from ego network"
            );
        }

        EgoNetwork {
            ego_id,
            vocabulary,
            node_features,
            ego_features,
            edges,
            circles,
            report,
        }
    }
}

/// Drop unknown and repeated features, keeping first-seen order; returns the unknown count
fn retain_known_features(features: &mut Vec<FeatureKey>, known: &HashSet<&FeatureKey>) -> usize {
    let unknown = features.iter().filter(|f| !known.contains(f)).count();
    let mut seen = HashSet::new();
    features.retain(|f| known.contains(f) && seen.insert(f.clone()));
    unknown
}
