//! Parsers for the per-ego-network snapshot files
//!
//! Every parser reads line by line from any [`BufRead`], skips blank lines,
//! and reports the first malformed line with its 1-based line number. `file`
//! is only used to label errors.

use crate::model::{Circle, Edge, FeatureKey, FeatureVocabulary};
use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;
use thiserror::Error;

/// Error raised while reading a snapshot file
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{file}:{line}: expected {expected} tokens, found {found}")]
    TokenCount {
        file: String,
        line: usize,
        expected: &'static str,
        found: usize,
    },

    #[error("{file}:{line}: invalid feature index '{value}'")]
    InvalidIndex {
        file: String,
        line: usize,
        value: String,
    },

    #[error("{file}:{line}: feature index {index} is already defined")]
    DuplicateIndex {
        file: String,
        line: usize,
        index: usize,
    },

    #[error("{file}:{line}: feature '{value}' has no ':' separating group and name")]
    MissingSeparator {
        file: String,
        line: usize,
        value: String,
    },

    #[error("{file}:{line}: invalid bit '{value}' at position {position}")]
    InvalidBit {
        file: String,
        line: usize,
        position: usize,
        value: String,
    },

    #[error("{file}:{line}: bit vector has {bits} positions but the vocabulary has {vocabulary}")]
    BitVectorTooLong {
        file: String,
        line: usize,
        bits: usize,
        vocabulary: usize,
    },

    #[error("{file}:{line}: bit position {position} has no vocabulary entry")]
    UnknownFeature {
        file: String,
        line: usize,
        position: usize,
    },

    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

/// Iterate non-blank lines as (1-based line number, content)
fn content_lines<R: BufRead>(
    reader: R,
    file: &str,
) -> impl Iterator<Item = Result<(usize, String), ParseError>> {
    let file = file.to_string();
    reader
        .lines()
        .enumerate()
        .map(move |(idx, line)| {
            line.map(|l| (idx + 1, l)).map_err(|source| ParseError::Io {
                file: file.clone(),
                source,
            })
        })
        .filter(|res| !matches!(res, Ok((_, l)) if l.trim().is_empty()))
}

/// Parse `src dst` lines
pub fn parse_edges<R: BufRead>(reader: R, file: &str) -> Result<Vec<Edge>, ParseError> {
    let mut edges = Vec::new();

    for entry in content_lines(reader, file) {
        let (line, text) = entry?;
        let tokens: Vec<&str> = text.split_whitespace().collect();
        match tokens.as_slice() {
            [src, dst] => edges.push(Edge::new(*src, *dst)),
            other => {
                return Err(ParseError::TokenCount {
                    file: file.to_string(),
                    line,
                    expected: "2",
                    found: other.len(),
                })
            }
        }
    }

    Ok(edges)
}

/// Parse `index group:name` lines
///
/// The first whitespace separates the index from the feature text, so names
/// may contain spaces; the first `:` separates group from name.
pub fn parse_feature_vocabulary<R: BufRead>(
    reader: R,
    file: &str,
) -> Result<FeatureVocabulary, ParseError> {
    let mut vocabulary = FeatureVocabulary::new();

    for entry in content_lines(reader, file) {
        let (line, text) = entry?;
        let text = text.trim();

        let Some((index, feature)) = text.split_once(char::is_whitespace) else {
            return Err(ParseError::TokenCount {
                file: file.to_string(),
                line,
                expected: "2",
                found: 1,
            });
        };

        let index: usize = index.parse().map_err(|_| ParseError::InvalidIndex {
            file: file.to_string(),
            line,
            value: index.to_string(),
        })?;

        let feature = feature.trim_start();
        let Some((group, name)) = feature.split_once(':') else {
            return Err(ParseError::MissingSeparator {
                file: file.to_string(),
                line,
                value: feature.to_string(),
            });
        };

        if vocabulary.insert(index, FeatureKey::new(group, name)).is_some() {
            return Err(ParseError::DuplicateIndex {
                file: file.to_string(),
                line,
                index,
            });
        }
    }

    Ok(vocabulary)
}

/// Map a bit vector onto the vocabulary, returning the active features
fn active_features(
    bits: &[&str],
    vocabulary: &FeatureVocabulary,
    file: &str,
    line: usize,
) -> Result<Vec<FeatureKey>, ParseError> {
    if bits.len() > vocabulary.len() {
        return Err(ParseError::BitVectorTooLong {
            file: file.to_string(),
            line,
            bits: bits.len(),
            vocabulary: vocabulary.len(),
        });
    }

    let mut active = Vec::new();
    for (position, bit) in bits.iter().enumerate() {
        match *bit {
            "0" => {}
            "1" => {
                let key = vocabulary
                    .get(position)
                    .ok_or_else(|| ParseError::UnknownFeature {
                        file: file.to_string(),
                        line,
                        position,
                    })?;
                active.push(key.clone());
            }
            other => {
                return Err(ParseError::InvalidBit {
                    file: file.to_string(),
                    line,
                    position,
                    value: other.to_string(),
                })
            }
        }
    }

    Ok(active)
}

/// Parse `nodeId b0 b1 … bn` lines into node -> active features
///
/// A node listed twice keeps its last line.
pub fn parse_node_feature_bits<R: BufRead>(
    reader: R,
    file: &str,
    vocabulary: &FeatureVocabulary,
) -> Result<BTreeMap<String, Vec<FeatureKey>>, ParseError> {
    let mut features = BTreeMap::new();

    for entry in content_lines(reader, file) {
        let (line, text) = entry?;
        let mut tokens = text.split_whitespace();
        let Some(node_id) = tokens.next() else {
            continue;
        };
        let bits: Vec<&str> = tokens.collect();
        let active = active_features(&bits, vocabulary, file, line)?;
        features.insert(node_id.to_string(), active);
    }

    Ok(features)
}

/// Parse the single `b0 b1 … bn` line of an `.egofeat` file
///
/// Returns `None` for an empty file. Only the first non-blank line is read.
pub fn parse_ego_feature_bits<R: BufRead>(
    reader: R,
    file: &str,
    vocabulary: &FeatureVocabulary,
) -> Result<Option<Vec<FeatureKey>>, ParseError> {
    match content_lines(reader, file).next() {
        None => Ok(None),
        Some(entry) => {
            let (line, text) = entry?;
            let bits: Vec<&str> = text.split_whitespace().collect();
            active_features(&bits, vocabulary, file, line).map(Some)
        }
    }
}

/// Parse `circleName member1 member2 …` lines
///
/// Circles keep first-seen order; a repeated circle name appends to the
/// existing circle. Duplicate members are preserved.
pub fn parse_circles<R: BufRead>(reader: R, file: &str) -> Result<Vec<Circle>, ParseError> {
    let mut circles: Vec<Circle> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in content_lines(reader, file) {
        let (_, text) = entry?;
        let mut tokens = text.split_whitespace();
        let Some(name) = tokens.next() else {
            continue;
        };

        let idx = *positions.entry(name.to_string()).or_insert_with(|| {
            circles.push(Circle {
                name: name.to_string(),
                members: Vec::new(),
            });
            circles.len() - 1
        });
        circles[idx].members.extend(tokens.map(str::to_string));
    }

    Ok(circles)
}
