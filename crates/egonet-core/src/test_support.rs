//! Shared fixtures for unit, integration and contract tests
//!
//! Enabled in other crates through the `test-utils` feature.

use crate::model::{Circle, Edge, EgoNetwork, FeatureKey, FeatureVocabulary};
use std::io;
use std::path::Path;

/// Ego id of the small fixture network
pub const FIXTURE_EGO_ID: &str = "100";

pub const FIXTURE_EDGES: &str = "1 2\n2 3\n";
pub const FIXTURE_FEATNAMES: &str = "0 gender:1\n1 school:Stanford University\n";
pub const FIXTURE_FEAT: &str = "1 1 0\n2 1 1\n3 0 1\n";
pub const FIXTURE_EGOFEAT: &str = "1 0\n";
pub const FIXTURE_CIRCLES: &str = "friends 1 2\n";

/// Expected users per ego for the fixture
pub const FIXTURE_USERS: u64 = 3;
/// Expected user-to-user edges for the fixture
pub const FIXTURE_EDGE_COUNT: u64 = 2;
/// Expected mean feature count over nodes with at least one feature
pub const FIXTURE_AVG_FEATURES: f64 = 1.25;

/// Write the fixture file-set for ego `100` into `dir`
pub fn write_fixture_dataset(dir: &Path) -> io::Result<()> {
    let files = [
        ("edges", FIXTURE_EDGES),
        ("featnames", FIXTURE_FEATNAMES),
        ("feat", FIXTURE_FEAT),
        ("egofeat", FIXTURE_EGOFEAT),
        ("circles", FIXTURE_CIRCLES),
    ];
    for (ext, content) in files {
        std::fs::write(dir.join(format!("{FIXTURE_EGO_ID}.{ext}")), content)?;
    }
    Ok(())
}

/// The fixture network built in memory (same content as the files)
pub fn fixture_network() -> EgoNetwork {
    let gender = FeatureKey::new("gender", "1");
    let school = FeatureKey::new("school", "Stanford University");

    EgoNetwork::builder(FIXTURE_EGO_ID)
        .vocabulary(FeatureVocabulary::from_iter([
            (0, gender.clone()),
            (1, school.clone()),
        ]))
        .user("1", vec![gender.clone()])
        .user("2", vec![gender.clone(), school.clone()])
        .user("3", vec![school])
        .ego_features(vec![gender])
        .edges(vec![Edge::new("1", "2"), Edge::new("2", "3")])
        .circles(vec![Circle {
            name: "friends".into(),
            members: vec!["1".into(), "2".into()],
        }])
        .build()
}

/// A network where one feature name appears in two groups
pub fn colliding_names_network() -> EgoNetwork {
    let first = FeatureKey::new("first_name", "alex");
    let last = FeatureKey::new("last_name", "alex");

    EgoNetwork::builder("200")
        .vocabulary(FeatureVocabulary::from_iter([
            (0, first.clone()),
            (1, last.clone()),
        ]))
        .user("a", vec![first])
        .user("b", vec![last])
        .edges(vec![Edge::new("a", "b")])
        .build()
}

/// Ego id of [`mutual_follows_network`]
pub const MUTUAL_EGO_ID: &str = "500";

/// A network with two mutual pairs and one user whose out-degree is above the mean
///
/// Out-degrees are 11:3 and 1 for everyone else, so only `11` is above the
/// mean of 1.4. Circle `team` shares two features and `club` shares two more.
pub fn mutual_follows_network() -> EgoNetwork {
    let female = FeatureKey::new("gender", "female");
    let male = FeatureKey::new("gender", "male");
    let mit = FeatureKey::new("school", "mit");
    let en = FeatureKey::new("locale", "en");

    EgoNetwork::builder(MUTUAL_EGO_ID)
        .vocabulary(FeatureVocabulary::from_iter([
            (0, female.clone()),
            (1, male.clone()),
            (2, mit.clone()),
            (3, en.clone()),
        ]))
        .user("11", vec![female.clone(), mit.clone()])
        .user("12", vec![female.clone(), mit])
        .user("13", vec![male.clone(), en.clone()])
        .user("14", vec![male, en.clone()])
        .user("15", vec![female])
        .ego_features(vec![en])
        .edges(vec![
            Edge::new("11", "12"),
            Edge::new("12", "11"),
            Edge::new("11", "13"),
            Edge::new("11", "14"),
            Edge::new("13", "14"),
            Edge::new("14", "13"),
            Edge::new("15", "11"),
        ])
        .circles(vec![
            Circle {
                name: "team".into(),
                members: vec!["11".into(), "12".into(), "15".into()],
            },
            Circle {
                name: "club".into(),
                members: vec!["13".into(), "14".into()],
            },
            Circle {
                name: "solo".into(),
                members: vec!["15".into()],
            },
        ])
        .build()
}

/// Two ego networks, `e1` and `e2`, that both contain users `u1` and `u2`
pub fn shared_users_networks() -> Vec<EgoNetwork> {
    let female = FeatureKey::new("gender", "female");
    let male = FeatureKey::new("gender", "male");
    let vocabulary = FeatureVocabulary::from_iter([(0, female.clone()), (1, male.clone())]);

    let first = EgoNetwork::builder("e1")
        .vocabulary(vocabulary.clone())
        .user("u1", vec![female.clone()])
        .user("u2", vec![male.clone()])
        .edges(vec![Edge::new("u1", "u2"), Edge::new("u2", "u1")])
        .circles(vec![Circle {
            name: "pair".into(),
            members: vec!["u1".into(), "u2".into()],
        }])
        .build();
    let second = EgoNetwork::builder("e2")
        .vocabulary(vocabulary)
        .user("u1", vec![female])
        .user("u2", vec![male])
        .edges(vec![Edge::new("u2", "u1")])
        .build();

    vec![first, second]
}

/// Deterministic synthetic network for chunking and throughput tests
///
/// Users `0..users` in ego `ego_id`, a ring of follows edges plus a chord every
/// seventh user, one circle per ten users, and `features` features spread over
/// four groups.
pub fn synthetic_network(ego_id: &str, users: usize, features: usize) -> EgoNetwork {
    let vocabulary: FeatureVocabulary = (0..features)
        .map(|i| (i, FeatureKey::new(format!("g{}", i % 4), format!("f{i}"))))
        .collect();
    let user_id = |i: usize| format!("{ego_id}-{i}");

    let mut builder = EgoNetwork::builder(ego_id).vocabulary(vocabulary.clone());
    for i in 0..users {
        let feats = (0..features)
            .filter(|f| (i + f) % 3 == 0)
            .filter_map(|f| vocabulary.get(f).cloned())
            .collect();
        builder = builder.user(user_id(i), feats);
    }

    let mut edges = Vec::new();
    if users > 1 {
        for i in 0..users {
            edges.push(Edge::new(user_id(i), user_id((i + 1) % users)));
            if i % 7 == 0 {
                edges.push(Edge::new(user_id(i), user_id((i + users / 2) % users)));
            }
        }
    }

    let circles = (0..users.div_ceil(10))
        .map(|c| Circle {
            name: format!("circle{c}"),
            members: (c * 10..users.min(c * 10 + 10)).map(user_id).collect(),
        })
        .collect();

    if let Some(first) = vocabulary.get(0).cloned() {
        builder = builder.ego_features(vec![first]);
    }

    builder.edges(edges).circles(circles).build()
}
