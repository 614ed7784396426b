//! Bus-domain assignment across hierarchy levels.

use ghostbus_conformance::{default_pipeline, PipelineError, LB_BUS};
use ghostbus_elaborate::BuildError;

const HOST: &str = r#"{"clk": "hclk", "addr": "haddr", "dout": "hwdata", "din": "hrdata", "we": "hwe"}"#;
const DSP: &str = r#"{"clk": "dclk", "addr": "daddr", "dout": "dwdata", "din": "drdata", "we": "dwe",
                      "wstb": "dwstb"}"#;

fn two_bus(instances: &str, nets: &str) -> String {
    format!(
        r#"{{"top": "top", "modules": [
            {{"name": "top",
              "buses": [
                {{"name": "host", "nets": {HOST}, "address_width": 10, "data_width": 32}},
                {{"name": "dsp", "nets": {DSP}, "address_width": 8, "data_width": 16, "base": 4096}}],
              "nets": [{nets}],
              "instances": [{instances}]}},
            {{"name": "radio", "nets": [{{"name": "freq", "width": 24}}]}},
            {{"name": "filt", "nets": [{{"name": "tap", "width": 12}}, {{"name": "kick", "width": 1, "pulse": true}}]}}]}}"#
    )
}

fn build_error(text: &str) -> BuildError {
    match default_pipeline(text) {
        Err(PipelineError::Build(err)) => err,
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("pipeline unexpectedly succeeded"),
    }
}

#[test]
fn untagged_instance_under_two_buses_is_ambiguous() {
    let text = two_bus(r#"{"name": "u_radio", "module": "radio"}"#, "");
    let err = build_error(&text);
    assert!(matches!(err, BuildError::AmbiguousBusDomain { ref element, .. } if element == "u_radio"));
}

#[test]
fn tagged_instances_get_separate_outputs() {
    let text = two_bus(
        r#"{"name": "u_radio", "module": "radio", "bus": "host"},
           {"name": "u_filt", "module": "filt", "bus": "dsp"}"#,
        r#"{"name": "mode", "width": 2, "bus": "host"}"#,
    );
    let result = default_pipeline(&text).unwrap();
    assert_eq!(result.hierarchy.domains.len(), 2);
    for name in [
        "ghostbus_ports_host.vh",
        "ghostbus_ports_dsp.vh",
        "ghostbus_top_host.vh",
        "ghostbus_top_dsp.vh",
        "ghostbus_radio_host.vh",
        "ghostbus_filt_dsp.vh",
    ] {
        assert!(result.file(name).is_some(), "missing {name}");
    }
    assert!(result.file("ghostbus_filt_host.vh").is_none());

    let filt = result.node("top.u_filt").unwrap();
    assert!(filt.base >= 4096 && filt.base < 4096 + 256);
    let radio = result.node("top.u_radio").unwrap();
    assert!(radio.base < 1024);

    // The dsp bus carries a write strobe, so pulses decode against it.
    let decode = result.file("ghostbus_filt_dsp.vh").unwrap();
    assert!(decode.contains("dwstb"));
}

#[test]
fn multi_domain_flat_map_keeps_every_register() {
    let text = two_bus(
        r#"{"name": "u_radio", "module": "radio", "bus": "host"},
           {"name": "u_filt", "module": "filt", "bus": "dsp"}"#,
        "",
    );
    let result = default_pipeline(&text).unwrap();
    let map = result.map.as_object().unwrap();
    assert!(map.contains_key("freq"));
    assert!(map.contains_key("tap"));
    assert!(map["tap"]["base_address"].as_u64().unwrap() >= 4096);
}

#[test]
fn unknown_bus_tag_is_rejected() {
    let text = two_bus(r#"{"name": "u_radio", "module": "radio", "bus": "nope"}"#, "");
    assert!(matches!(build_error(&text), BuildError::AmbiguousBusDomain { .. }));
}

#[test]
fn registers_above_the_bus_are_unreachable() {
    let text = format!(
        r#"{{"top": "chip", "modules": [
            {{"name": "chip", "nets": [{{"name": "stray", "width": 4}}],
              "instances": [{{"name": "u_sys", "module": "sys"}}]}},
            {{"name": "sys",
              "buses": [{{"nets": {LB_BUS}, "address_width": 8, "data_width": 32}}],
              "nets": [{{"name": "ok", "width": 4}}]}}]}}"#
    );
    assert!(matches!(build_error(&text), BuildError::MissingBus { ref element, .. } if element == "stray"));
}

#[test]
fn bus_declared_below_the_top_trims_paths() {
    let text = format!(
        r#"{{"top": "chip", "modules": [
            {{"name": "chip", "instances": [{{"name": "u_sys", "module": "sys"}}]}},
            {{"name": "sys",
              "buses": [{{"nets": {LB_BUS}, "address_width": 8, "data_width": 32}}],
              "instances": [{{"name": "u_a", "module": "leaf"}}, {{"name": "u_b", "module": "leaf"}}]}},
            {{"name": "leaf", "nets": [{{"name": "r", "width": 4}}]}}]}}"#
    );
    let config = ghostbus_conformance::make_config("[output]\nshort = false\n").unwrap();
    let result = ghostbus_conformance::full_pipeline(&text, &config).unwrap();
    let keys: Vec<&str> = result.map.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["u_a.r", "u_b.r"]);
    assert!(result.file("ghostbus_sys.vh").is_some());
    assert!(result.file("ghostbus_chip.vh").is_none());
}

#[test]
fn nested_bus_declaration_is_unsupported() {
    let text = format!(
        r#"{{"top": "top", "modules": [
            {{"name": "top",
              "buses": [{{"nets": {LB_BUS}, "address_width": 8, "data_width": 32}}],
              "instances": [{{"name": "u_sub", "module": "sub"}}]}},
            {{"name": "sub",
              "buses": [{{"nets": {LB_BUS}, "address_width": 4, "data_width": 32}}],
              "nets": [{{"name": "r", "width": 1}}]}}]}}"#
    );
    assert!(matches!(build_error(&text), BuildError::FeatureUnsupported(_)));
}
