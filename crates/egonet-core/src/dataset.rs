//! Dataset discovery and loading of one ego network's file-set

use crate::model::EgoNetwork;
use crate::parser::{
    parse_circles, parse_edges, parse_ego_feature_bits, parse_feature_vocabulary,
    parse_node_feature_bits, ParseError,
};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The five files of one ego network, named `<egoId>.<ext>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgoNetworkFiles {
    pub ego_id: String,
    pub edges: PathBuf,
    pub featnames: PathBuf,
    pub feat: PathBuf,
    pub egofeat: PathBuf,
    pub circles: PathBuf,
}

impl EgoNetworkFiles {
    pub fn in_dir(dir: &Path, ego_id: &str) -> Self {
        let file = |ext: &str| dir.join(format!("{ego_id}.{ext}"));
        Self {
            ego_id: ego_id.to_string(),
            edges: file("edges"),
            featnames: file("featnames"),
            feat: file("feat"),
            egofeat: file("egofeat"),
            circles: file("circles"),
        }
    }
}

/// Ego ids of every `<egoId>.edges` file in `dir`, sorted
pub fn discover_ego_ids(dir: &Path) -> io::Result<Vec<String>> {
    let mut ids = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("edges") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            ids.push(stem.to_string());
        }
    }

    ids.sort();
    Ok(ids)
}

fn open(path: &Path) -> Result<BufReader<File>, ParseError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| ParseError::Io {
            file: path.display().to_string(),
            source,
        })
}

/// Open a file that may legitimately be absent
fn open_optional(path: &Path) -> Result<Option<BufReader<File>>, ParseError> {
    match File::open(path) {
        Ok(f) => Ok(Some(BufReader::new(f))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ParseError::Io {
            file: path.display().to_string(),
            source,
        }),
    }
}

/// Parse a file-set into the canonical model
///
/// `.edges`, `.featnames` and `.feat` are required. A missing `.egofeat`
/// means the ego has no features; a missing `.circles` means no circles.
pub fn load_ego_network(files: &EgoNetworkFiles) -> Result<EgoNetwork, ParseError> {
    let label = |p: &Path| p.display().to_string();

    let vocabulary = parse_feature_vocabulary(open(&files.featnames)?, &label(&files.featnames))?;
    let node_features =
        parse_node_feature_bits(open(&files.feat)?, &label(&files.feat), &vocabulary)?;
    let edges = parse_edges(open(&files.edges)?, &label(&files.edges))?;

    let ego_features = match open_optional(&files.egofeat)? {
        Some(reader) => parse_ego_feature_bits(reader, &label(&files.egofeat), &vocabulary)?,
        None => None,
    };
    let circles = match open_optional(&files.circles)? {
        Some(reader) => parse_circles(reader, &label(&files.circles))?,
        None => Vec::new(),
    };

    debug!(
        ego_id = %files.ego_id,
        vocabulary = vocabulary.len(),
        users = node_features.len(),
        edges = edges.len(),
        circles = circles.len(),
        "Parsed ego network files"
    );

    let mut builder = EgoNetwork::builder(&files.ego_id)
        .vocabulary(vocabulary)
        .node_features(node_features)
        .edges(edges)
        .circles(circles);
    if let Some(features) = ego_features {
        builder = builder.ego_features(features);
    }

    Ok(builder.build())
}

impl EgoNetwork {
    /// Parse a file-set; see [`load_ego_network`]
    pub fn load(files: &EgoNetworkFiles) -> Result<Self, ParseError> {
        load_ego_network(files)
    }
}
