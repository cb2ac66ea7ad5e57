
use relay_cli::engine::executor::{prepare_call, PreparedCall};
use relay_cli::error::{Error, UsageIssue};
use relay_cli::schema::Schema;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::Write;
use test_helpers::{args, optional_object, TestOperation};
use tracing::Span;

fn volume_op() -> TestOperation {
    let b = optional_object(vec![("x", Schema::integer()), ("y", Schema::string())]);
    TestOperation::new("create")
        .with_parameters(Schema::object(vec![("a", Schema::string()), ("b", b)], vec!["a"]))
        .with_configs(optional_object(vec![
            ("region", Schema::string().with_default(json!("br-se1"))),
            ("zone", Schema::string()),
        ]))
        .with_positionals(&["a"])
}

fn prepare(op: &TestOperation, argv: &[&str], source: &BTreeMap<String, Value>) -> Result<PreparedCall, Error> {
    prepare_call(op, &args(argv), "relay run create", source, false, &Span::none())
}

fn no_source() -> BTreeMap<String, Value> {
    BTreeMap::new()
}

#[test]
fn test_positional_and_child_flag_combine() {
    let call = prepare(&volume_op(), &["hello", "--b.x=3"], &no_source()).unwrap();

    assert_eq!(Value::Object(call.parameters), json!({"a": "hello", "b": {"x": 3}}));
}

#[test]
fn test_child_flags_merge_into_explicit_parent() {
    let call = prepare(&volume_op(), &["--a", "n", "--b", r#"{"y": "first"}"#, "--b.x", "7"], &no_source()).unwrap();

    assert_eq!(call.parameters.get("b"), Some(&json!({"x": 7, "y": "first"})));
}

#[test]
fn test_later_parent_json_replaces_children() {
    let call = prepare(&volume_op(), &["--a=n", "--b.x=1", r#"--b={"y": "z"}"#], &no_source()).unwrap();

    assert_eq!(call.parameters.get("b"), Some(&json!({"y": "z"})));
}

#[test]
fn test_config_layers_explicit_source_then_default() {
    let mut source = no_source();
    source.insert("zone".to_string(), json!("z1"));
    source.insert("region".to_string(), json!("br-ne1"));

    let call = prepare(&volume_op(), &["n", "--region=br-mg1"], &source).unwrap();

    assert_eq!(call.configs.get("region"), Some(&json!("br-mg1")));
    assert_eq!(call.configs.get("zone"), Some(&json!("z1")));
}

#[test]
fn test_config_default_applies_when_source_is_silent() {
    let call = prepare(&volume_op(), &["n"], &no_source()).unwrap();

    assert_eq!(call.configs.get("region"), Some(&json!("br-se1")));
    assert!(!call.configs.contains_key("zone"));
}

#[test]
fn test_parameters_ignore_the_value_source() {
    let mut source = no_source();
    source.insert("b".to_string(), json!({"x": 1}));

    let call = prepare(&volume_op(), &["n"], &source).unwrap();

    assert!(!call.parameters.contains_key("b"));
}

#[test]
fn test_help_sentinel_returns_flag_help() {
    let err = prepare(&volume_op(), &["--b.x=help"], &no_source()).unwrap_err();

    let Error::HelpRequested { flag, help } = err else {
        panic!("expected help, got {err:?}");
    };
    assert_eq!(flag, "b.x");
    assert!(help.starts_with("--b.x <integer>"));
}

#[test]
fn test_help_flag_returns_command_help() {
    let err = prepare(&volume_op(), &["--help"], &no_source()).unwrap_err();

    let Error::HelpRequested { flag, help } = err else {
        panic!("expected help, got {err:?}");
    };
    assert_eq!(flag, "help");
    assert!(help.contains("--b.x"));
}

#[test]
fn test_help_wins_over_missing_required() {
    let err = prepare(&volume_op(), &["--zone=help"], &no_source()).unwrap_err();
    assert!(matches!(err, Error::HelpRequested { ref flag, .. } if flag == "zone"));
}

#[test]
fn test_missing_required_flags_are_reported_together() {
    let op = TestOperation::new("op").with_parameters(Schema::object(
        vec![("name", Schema::string()), ("size", Schema::integer()), ("tag", Schema::string())],
        vec!["name", "size"],
    ));

    let Error::Usage(usage) = prepare(&op, &["--tag=x"], &no_source()).unwrap_err() else {
        panic!("expected usage error");
    };

    assert_eq!(
        usage.issues,
        vec![UsageIssue::MissingRequired(vec!["name".to_string(), "size".to_string()])]
    );
    assert_eq!(usage.to_string(), "missing required flags: --name, --size");
}

#[test]
fn test_invalid_values_and_missing_flags_share_one_error() {
    let op = TestOperation::new("op").with_parameters(Schema::object(
        vec![("name", Schema::string()), ("size", Schema::integer())],
        vec!["name"],
    ));

    let Error::Usage(usage) = prepare(&op, &["--size=big"], &no_source()).unwrap_err() else {
        panic!("expected usage error");
    };

    assert_eq!(usage.issues.len(), 2);
    assert_eq!(usage.flag_names(), vec!["size", "name"]);
}

#[test]
fn test_schema_violations_are_usage_errors() {
    let op = TestOperation::new("op").with_parameters(optional_object(vec![(
        "tier",
        Schema::string().with_enum([json!("gold"), json!("silver")]),
    )]));

    let Error::Usage(usage) = prepare(&op, &["--tier=bronze"], &no_source()).unwrap_err() else {
        panic!("expected usage error");
    };

    assert!(matches!(&usage.issues[..], [UsageIssue::InvalidValue { flag, .. }] if flag == "tier"));
}

#[test]
fn test_unknown_flags_are_usage_errors() {
    let err = prepare(&volume_op(), &["n", "--colour=red"], &no_source()).unwrap_err();

    let Error::Usage(usage) = err else {
        panic!("expected usage error, got {err:?}");
    };
    assert!(matches!(&usage.issues[..], [UsageIssue::Unrecognized(msg)] if msg.contains("--colour")));
}

#[test]
fn test_array_flags_accumulate() {
    let op = TestOperation::new("op")
        .with_parameters(optional_object(vec![("tags", Schema::array(Schema::string()))]));

    let call = prepare(&op, &["--tags=a", "--tags", "b"], &no_source()).unwrap();

    assert_eq!(call.parameters.get("tags"), Some(&json!(["a", "b"])));
}

#[test]
fn test_json_file_sentinel_loads_value() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"x": 42, "y": "from-file"}}"#).unwrap();
    let raw = format!("--b=@{}", file.path().display());

    let call = prepare(&volume_op(), &["n", &raw], &no_source()).unwrap();

    assert_eq!(call.parameters.get("b"), Some(&json!({"x": 42, "y": "from-file"})));
}

#[test]
fn test_follow_and_link_params_are_exposed() {
    let call = prepare(
        &volume_op(),
        &["n", "--follow", "get", "--link-param", "size=10", "--link-param=label=fast disk"],
        &no_source(),
    )
    .unwrap();

    assert_eq!(call.follow().as_deref(), Some("get"));
    let extra = call.link_parameters().unwrap();
    assert_eq!(extra.get("size"), Some(&json!(10)));
    assert_eq!(extra.get("label"), Some(&json!("fast disk")));
    assert!(!call.parameters.contains_key("follow"));
}

#[test]
fn test_malformed_link_param_is_rejected() {
    let call = prepare(&volume_op(), &["n", "--link-param", "oops"], &no_source()).unwrap();
    assert!(matches!(call.link_parameters(), Err(Error::Usage(_))));
}
