//! Integration tests for rendering templates against documents

use doc_template::{parse, render, render_with_config, ErrorKind, Node, RenderConfig, RenderError};
use pretty_assertions::assert_eq;

fn deployment() -> Node {
    Node::from_json_str(
        r#"{
            "metadata": {"name": "web", "labels": {"app": "web", "tier": "frontend"}},
            "spec": {
                "replicas": 2,
                "template": {
                    "spec": {
                        "containers": [
                            {"name": "web", "image": "nginx:1.12", "ports": [80, 443]},
                            {"name": "sidecar", "image": "envoy:1.29", "ports": []}
                        ]
                    }
                }
            },
            "status": {
                "conditions": [
                    {"type": "Available", "status": "True"},
                    {"type": "Progressing", "status": "True"}
                ]
            }
        }"#,
    )
    .expect("Should load")
}

#[test]
fn test_scenario_field_access() {
    let doc = Node::mapping([("spec", Node::mapping([("replicas", Node::from(2_i64))]))]);
    assert_eq!(render(&doc, "{{ .spec.replicas }}").unwrap(), "2");
}

#[test]
fn test_scenario_index_then_field() {
    let out = render(
        &deployment(),
        "{{ (index .spec.template.spec.containers 0).image }}",
    )
    .unwrap();
    assert_eq!(out, "nginx:1.12");
}

#[test]
fn test_scenario_accumulate_flag() {
    let template = r#"{{ $available := false }}
{{- range .status.conditions }}
  {{- if and (eq .type "Available") (eq .status "True") }}
    {{- $available = true }}
  {{- end }}
{{- end }}
{{- $available }}"#;
    assert_eq!(render(&deployment(), template).unwrap(), "true");
}

#[test]
fn test_scenario_missing_field() {
    let err = render(&deployment(), "{{ .spec.nonexistent }}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldNotFound);
    assert!(err.detail().contains(".spec.nonexistent"));
}

#[test]
fn test_scenario_unterminated_range() {
    // The document is never read: Null would fail any field access
    let err = render(&Node::Null, "{{ range .status.conditions }}{{ .type }}").unwrap_err();
    assert!(matches!(err, RenderError::Parse(_)));
    assert_eq!(err.kind(), ErrorKind::UnterminatedBlock);
}

#[test]
fn test_get_field_returns_stored_node() {
    let doc = deployment();
    let labels = doc
        .get_field("metadata")
        .and_then(|m| m.get_field("labels"))
        .unwrap();
    assert_eq!(
        labels,
        &Node::mapping([("app", Node::from("web")), ("tier", Node::from("frontend"))])
    );
}

#[test]
fn test_get_index_bounds() {
    let items = Node::sequence([Node::from("a"), Node::from("b"), Node::from("c")]);
    for (i, expected) in ["a", "b", "c"].iter().enumerate() {
        assert_eq!(items.get_index(i as i64).unwrap(), &Node::from(*expected));
    }
    for i in [-1_i64, 3, 100] {
        assert!(items.get_index(i).is_err());
        let err = render(
            &Node::mapping([("items", items.clone())]),
            &format!("{{{{ index .items {} }}}}", i),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
    }
}

#[test]
fn test_empty_range_is_like_no_block() {
    let doc = Node::mapping([("xs", Node::sequence([]))]);
    let with_block = render(
        &doc,
        "{{ $seen := false }}a{{ range .xs }}{{ $seen = true }}x{{ end }}b {{ $seen }}",
    )
    .unwrap();
    let without_block = render(&doc, "{{ $seen := false }}ab {{ $seen }}").unwrap();
    assert_eq!(with_block, without_block);
    assert_eq!(with_block, "ab false");
}

#[test]
fn test_assignment_visible_in_later_iterations() {
    let doc = Node::mapping([(
        "xs",
        Node::sequence([Node::from(1_i64), Node::from(2_i64), Node::from(3_i64)]),
    )]);
    let out = render(
        &doc,
        "{{ $prev := 0 }}{{ range .xs }}{{ $prev }}->{{ . }} {{ $prev = . }}{{ end }}last={{ $prev }}",
    )
    .unwrap();
    assert_eq!(out, "0->1 1->2 2->3 last=3");
}

#[test]
fn test_render_is_idempotent() {
    let doc = deployment();
    let template = "{{ range $i, $c := .spec.template.spec.containers }}{{ $i }}:{{ $c.name }} {{ end }}";
    let first = render(&doc, template).unwrap();
    let second = render(&doc, template).unwrap();
    assert_eq!(first, "0:web 1:sidecar ");
    assert_eq!(first, second);
}

#[test]
fn test_parse_once_render_many() {
    let template = parse("{{ .metadata.name }} has {{ .spec.replicas }} replicas").unwrap();
    let doc = deployment();
    let other = Node::from_json_str(r#"{"metadata": {"name": "api"}, "spec": {"replicas": 5}}"#).unwrap();
    assert_eq!(template.render(&doc).unwrap(), "web has 2 replicas");
    assert_eq!(template.render(&other).unwrap(), "api has 5 replicas");
}

#[test]
fn test_root_variable_in_nested_range() {
    let out = render(
        &deployment(),
        "{{ range .spec.template.spec.containers }}{{ $.metadata.name }}/{{ .name }};{{ end }}",
    )
    .unwrap();
    assert_eq!(out, "web/web;web/sidecar;");
}

#[test]
fn test_nested_range() {
    let out = render(
        &deployment(),
        "{{ range .spec.template.spec.containers }}{{ .name }}[{{ range .ports }}{{ . }},{{ else }}none{{ end }}] {{ end }}",
    )
    .unwrap();
    assert_eq!(out, "web[80,443,] sidecar[none] ");
}

#[test]
fn test_index_on_labels() {
    let out = render(&deployment(), r#"{{ index .metadata.labels "tier" }}"#).unwrap();
    assert_eq!(out, "frontend");
    let err = render(&deployment(), r#"{{ index .metadata.labels "zone" }}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldNotFound);
}

#[test]
fn test_close_marker_inside_string() {
    let doc = Node::mapping([("s", Node::from("}}"))]);
    assert_eq!(render(&doc, r#"{{ eq .s "}}" }}"#).unwrap(), "true");
}

#[test]
fn test_comments_and_trim() {
    let out = render(&deployment(), "a  {{- /* note */ -}}  b").unwrap();
    assert_eq!(out, "ab");
    let out = render(&deployment(), "a {{/* note */}} b").unwrap();
    assert_eq!(out, "a  b");
}

#[test]
fn test_negative_number_is_not_trim() {
    assert_eq!(render(&Node::Null, "x {{-3}} y").unwrap(), "x -3 y");
}

#[test]
fn test_custom_delimiters() {
    let config = RenderConfig::new().with_delimiters("<<", ">>");
    let out = render_with_config(&deployment(), "name: <<- .metadata.name >>", &config).unwrap();
    assert_eq!(out, "name:web");
}

#[test]
fn test_nesting_limit_enforced() {
    let config = RenderConfig::new().with_max_nesting(1);
    let err = render_with_config(
        &deployment(),
        "{{ range .status.conditions }}{{ if true }}x{{ end }}{{ end }}",
        &config,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
}

#[test]
fn test_strict_truthiness() {
    let err = render(&deployment(), "{{ if .metadata.name }}x{{ end }}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    let err = render(&deployment(), "{{ not .spec.replicas }}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_syntax_errors() {
    for source in [
        "{{ }}",
        "{{ .a",
        "{{ bogus }}",
        "{{ eq .a }}",
        "{{ and true }}",
        "{{ $ := 1 }}",
        "{{ (.a }}",
        "{{ if }}{{ end }}",
    ] {
        let err = render(&deployment(), source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError, "source: {}", source);
    }
}

#[test]
fn test_unexpected_end() {
    let err = render(&deployment(), "{{ if true }}{{ end }}{{ end }}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEnd);
    assert_eq!(err.span(), 22..31);
}

#[test]
fn test_undefined_variable_assignment() {
    let err = render(&deployment(), "{{ range .status.conditions }}{{ $ok = true }}{{ end }}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UndefinedVariable);
    assert_eq!(err.detail(), "undefined variable '$ok'");
}
