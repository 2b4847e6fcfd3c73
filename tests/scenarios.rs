use std::collections::BTreeSet;

use urlpattern_rs::config::MakeConfig;
use urlpattern_rs::{Config, PatternMaker};

/// Distinct rendered pattern paths, deduped: a run of identically-named URLs
/// yields one tree leaf per URL, so the same pattern string can appear on
/// several leaves once their shared ancestor is generalized.
fn patterns_for(urls: &[&str], min_cluster_num: i64) -> Vec<String> {
    let mut maker = PatternMaker::new(Config {
        make: MakeConfig {
            min_cluster_num,
            ..MakeConfig::default()
        },
    });
    for url in urls {
        maker.load(url).unwrap();
    }
    maker.cluster_all().unwrap();
    maker
        .dump()
        .iter()
        .map(|p| p.segments.join("/"))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[test]
fn scenario_a_numeric_id_cluster() {
    let out = patterns_for(
        &["http://x.y/u/1/p", "http://x.y/u/2/p", "http://x.y/u/3/p"],
        3,
    );
    assert_eq!(out.len(), 1);
    let segments: Vec<&str> = out[0].split('/').collect();
    assert_eq!(segments[0], "u");
    assert_eq!(segments[2], "p");
    assert!(segments[1] == "[0-9]+" || segments[1] == "[0-9]{1}");
}

#[test]
fn scenario_b_mixed_alpha_numeric() {
    let out = patterns_for(
        &["http://x.y/item-1", "http://x.y/item-2", "http://x.y/item-3"],
        3,
    );
    assert_eq!(out, vec!["item[\\-][0-9]+".to_string()]);
}

#[test]
fn scenario_c_extension_split() {
    let out = patterns_for(
        &["http://x.y/a.html", "http://x.y/b.html", "http://x.y/c.html"],
        3,
    );
    assert_eq!(out, vec!["[a-z]+[\\.]html".to_string()]);
}

#[test]
fn scenario_d_below_threshold_stays_literal() {
    let out = patterns_for(&["http://x.y/u/1", "http://x.y/u/2"], 3);
    assert_eq!(out, vec!["u/1".to_string(), "u/2".to_string()]);
}

#[test]
fn scenario_e_confused_majority_stays_literal() {
    let mut urls = Vec::new();
    for _ in 0..5 {
        urls.push("http://x.y/a/x");
        urls.push("http://x.y/a/y");
    }
    let out = patterns_for(&urls, 3);
    assert_eq!(out, vec!["a/x".to_string(), "a/y".to_string()]);
}

#[test]
fn scenario_f_cross_level_revision() {
    let mut urls = Vec::new();
    for _ in 0..5 {
        urls.push("http://x.y/1/a");
        urls.push("http://x.y/2/a");
        urls.push("http://x.y/3/a");
    }
    urls.push("http://x.y/1/b");

    // The exact split between what clusters at the first vs. second segment
    // is the single acknowledged ambiguity in the source; assert only the
    // properties that must hold regardless of how it resolves.
    let out = patterns_for(&urls, 3);
    assert!(!out.is_empty());
    for path in &out {
        assert_eq!(path.split('/').count(), 2);
    }
}

#[test]
fn determinism_across_repeated_runs() {
    let urls = vec![
        "http://x.y/item-1",
        "http://x.y/item-2",
        "http://x.y/item-3",
        "http://x.y/u/1/p",
        "http://x.y/u/2/p",
    ];
    let first = patterns_for(&urls, 3);
    let second = patterns_for(&urls, 3);
    assert_eq!(first, second);
}

#[test]
fn round_trip_path_query_fragment() {
    use urlpattern_rs::url::{pack, parse_url};

    let url = "http://x.y/a/b?k=v#frag";
    let (meta, pieces) = parse_url(url).unwrap();
    let reconstructed = pack(&meta, &pieces);
    assert_eq!(reconstructed, "/a/b?k=v#frag");
}

#[test]
fn irregular_urls_are_rejected_not_panicking() {
    let mut maker = PatternMaker::new(Config::default());
    assert!(maker.load("not-a-url").is_err());
    assert!(maker.load("http://x.y").is_err());
}
