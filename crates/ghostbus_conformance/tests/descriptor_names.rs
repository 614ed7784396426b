//! Naming rules of the JSON address map.

use ghostbus_conformance::{full_pipeline, make_config, single_module, PipelineError, LB_BUS};
use ghostbus_descriptor::{shortest_unique, DescriptorError};

fn keys(map: &serde_json::Value) -> Vec<String> {
    map.as_object().unwrap().keys().cloned().collect()
}

fn board(leaf_nets: &str) -> String {
    format!(
        r#"{{"top": "board", "modules": [
            {{"name": "board",
              "buses": [{{"nets": {LB_BUS}, "address_width": 10, "data_width": 32}}],
              "nets": [{{"name": "id", "width": 32, "kind": "wire", "access": "r"}}],
              "instances": [{{"name": "u_left", "module": "amp"}}, {{"name": "u_right", "module": "amp"}}]}},
            {{"name": "amp", "nets": [{leaf_nets}],
              "instances": [{{"name": "u_dac", "module": "dac"}}]}},
            {{"name": "dac", "nets": [{{"name": "code", "width": 14}}, {{"name": "gain", "width": 4}}]}}]}}"#
    )
}

fn map_with(netlist: &str, toml: &str) -> Result<serde_json::Value, PipelineError> {
    let config = make_config(toml).unwrap();
    full_pipeline(netlist, &config).map(|r| r.map)
}

#[test]
fn full_keys_follow_the_trimmed_hierarchy() {
    let map = map_with(&board(r#"{"name": "gain", "width": 8}"#), "[output]\nshort = false\n").unwrap();
    assert_eq!(
        keys(&map),
        [
            "id",
            "u_left.gain",
            "u_left.u_dac.code",
            "u_left.u_dac.gain",
            "u_right.gain",
            "u_right.u_dac.code",
            "u_right.u_dac.gain",
        ]
    );
}

#[test]
fn shortening_lengthens_only_what_collides() {
    let text = format!(
        r#"{{"top": "board", "modules": [
            {{"name": "board",
              "buses": [{{"nets": {LB_BUS}, "address_width": 10, "data_width": 32}}],
              "nets": [{{"name": "id", "width": 32, "kind": "wire", "access": "r"}}],
              "instances": [{{"name": "u_amp", "module": "amp"}}]}},
            {{"name": "amp", "nets": [{{"name": "gain", "width": 8}}],
              "instances": [{{"name": "u_dac", "module": "dac"}}]}},
            {{"name": "dac", "nets": [{{"name": "code", "width": 14}}, {{"name": "gain", "width": 4}}]}}]}}"#
    );
    let map = map_with(&text, "").unwrap();
    assert_eq!(keys(&map), ["code", "id", "u_amp.gain", "u_dac.gain"]);
}

#[test]
fn mangled_keys_use_underscores() {
    let map = map_with(&board(r#"{"name": "gain", "width": 8}"#), "[output]\nmangle = true\n").unwrap();
    assert!(keys(&map).iter().all(|k| !k.contains('.')));
    assert!(map.get("u_left_u_dac_gain").is_some());
}

#[test]
fn alias_overrides_the_path() {
    let text = single_module(
        6,
        32,
        r#""nets": [{"name": "cfg_word", "width": 16, "alias": "CONFIG"},
                    {"name": "mode", "width": 2}]"#,
    );
    let map = map_with(&text, "").unwrap();
    assert_eq!(keys(&map), ["CONFIG", "mode"]);
}

#[test]
fn alias_shared_by_two_instances_collides() {
    let err = map_with(&board(r#"{"name": "gain", "width": 8, "alias": "AMP_GAIN"}"#), "").unwrap_err();
    match err {
        PipelineError::Descriptor(DescriptorError::NameCollision { keys }) => {
            assert_eq!(keys, ["AMP_GAIN"])
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn dropped_paths_are_omitted() {
    let toml = "[output]\nshort = false\ndrops = [\"u_left.u_dac.code\", \"u_right.u_dac.code\"]\n";
    let map = map_with(&board(r#"{"name": "gain", "width": 8}"#), toml).unwrap();
    assert!(keys(&map).iter().all(|k| !k.ends_with("code")));
    assert!(map.get("u_left.u_dac.gain").is_some());
}

#[test]
fn shortest_unique_is_a_bijection() {
    let names: Vec<String> = ["a.b.c", "x.b.c", "a.y.c", "q", "a.q", "r.s.t.u"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let renames = shortest_unique(&names);
    assert_eq!(renames.len(), names.len());
    for (short, long) in &renames {
        assert!(long.ends_with(short.as_str()));
    }
    assert_eq!(renames.get("u").map(String::as_str), Some("r.s.t.u"));
}
