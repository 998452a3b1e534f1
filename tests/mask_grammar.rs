//! Field Mask Grammar Tests
//!
//! Normal form of the mask syntax, parse errors, and the reset masks the
//! model's specs produce for full updates.

use resource_status::fieldmask::{Error, FieldPath, Mask};
use resource_status::model::{
    Credential, EndpointSpec, FullUpdateResetMask, JobSpec, RegistryCredentials, VolumeMount,
};
use resource_status::{ensure_reset_mask, Metadata, RESET_MASK_HEADER};
use rstest::rstest;

fn normal(source: &str) -> String {
    Mask::unmarshal(source).unwrap().marshal()
}

// =============================================================================
// Normal form
// =============================================================================

#[rstest]
#[case("labels", "labels")]
#[case("spec.image,spec.args", "spec.(args,image)")]
#[case("spec.(image)", "spec.image")]
#[case("b,a,c", "a,b,c")]
#[case("(x,y).z", "x.z,y.z")]
#[case("volumes.*.read_only", "volumes.*.read_only")]
#[case("environment.\"HF_HOME\"", "environment.HF_HOME")]
#[case("labels.\"team/owner\"", "labels.\"team/owner\"")]
#[case(" spec . ( image , args ) ", "spec.(args,image)")]
fn test_normal_form(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(normal(source), expected);
}

#[rstest]
#[case("spec.(image,args),metadata.labels.*")]
#[case("*.(x,y),a.\"b c\".d")]
#[case("ports.*.(container_port,protocol),disk")]
fn test_normal_form_is_stable(#[case] source: &str) {
    let mask = Mask::unmarshal(source).unwrap();
    let marshalled = mask.marshal();

    let reparsed = Mask::unmarshal(&marshalled).unwrap();
    assert_eq!(reparsed, mask);
    assert_eq!(reparsed.marshal(), marshalled);
}

#[test]
fn test_empty_mask() {
    let mask = Mask::unmarshal("").unwrap();
    assert!(mask.is_empty());
    assert_eq!(mask.marshal(), "");
}

// =============================================================================
// Parse errors
// =============================================================================

#[rstest]
#[case("spec.$x", "unexpected symbol")]
#[case("a.\"open", "unterminated quoted string")]
#[case("a..b", "expecting field or submask")]
#[case("a b", "expecting separator or closing brace")]
#[case("a)", "unmatched right brace")]
#[case("a.(b,c", "unclosed left brace")]
fn test_parse_errors(#[case] source: &str, #[case] message: &str) {
    let err = Mask::unmarshal(source).unwrap_err();
    assert!(
        err.to_string().contains(message),
        "{:?} gave {:?}",
        source,
        err.to_string()
    );
    assert!(err.position().is_some());
}

#[test]
fn test_truncated_input() {
    assert_eq!(Mask::unmarshal("spec."), Err(Error::UnexpectedEnd));
}

// =============================================================================
// Single paths
// =============================================================================

#[test]
fn test_field_path_from_mask() {
    let path = FieldPath::unmarshal("spec.disk.size_bytes").unwrap().unwrap();
    assert_eq!(path.len(), 3);
    assert_eq!(path.to_string(), "spec.disk.size_bytes");

    assert_eq!(FieldPath::unmarshal("").unwrap(), None);
    assert_eq!(FieldPath::unmarshal("a,b"), Err(Error::MultiplePaths));
    assert_eq!(FieldPath::unmarshal("a.*"), Err(Error::Wildcard));
}

#[test]
fn test_mask_set_operations() {
    let left = Mask::unmarshal("a.(b,c),d").unwrap();
    let right = Mask::unmarshal("a.b,d").unwrap();

    assert_eq!(left.intersect_dumb(&right).marshal(), "a.b,d");

    let mut rest = left.clone();
    rest.subtract_dumb(&Mask::unmarshal("a.b").unwrap());
    assert_eq!(rest.marshal(), "a.c,d");

    let merged = right.merged(&Mask::unmarshal("e").unwrap());
    assert_eq!(merged.marshal(), "a.b,d,e");
}

// =============================================================================
// Reset masks of specs
// =============================================================================

#[test]
fn test_reset_mask_names_exactly_the_unset_fields() {
    let spec = EndpointSpec {
        image: Some("vllm/vllm-openai".to_string()),
        args: vec!["--model".to_string(), "meta-llama/Llama-3.1-8B".to_string()],
        platform: Some("gpu-h100-sxm".to_string()),
        preset: Some("1gpu-16vcpu-200gb".to_string()),
        instance_count: Some(1),
        ..Default::default()
    };
    let mask = spec.full_update_reset_mask();

    for set in ["image", "args", "platform", "preset", "instance_count"] {
        let path = FieldPath::unmarshal(set).unwrap().unwrap();
        assert!(!path.matches_reset_mask(Some(&mask)), "{} is set", set);
    }
    for unset in ["container_command", "disk", "network", "auth_token", "working_dir"] {
        let path = FieldPath::unmarshal(unset).unwrap().unwrap();
        assert!(path.matches_reset_mask_final(Some(&mask)), "{} is unset", unset);
    }
    assert!(mask.marshal().contains("environment.*"));
}

#[test]
fn test_reset_mask_descends_into_set_messages() {
    let spec = JobSpec {
        registry_credentials: Some(RegistryCredentials {
            username: Some("robot".to_string()),
            password: None,
        }),
        volumes: vec![VolumeMount {
            source: Some("s3://datasets/imagenet".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    };
    let mask = spec.full_update_reset_mask();

    let password = FieldPath::unmarshal("registry_credentials.password").unwrap().unwrap();
    assert!(password.matches_reset_mask_final(Some(&mask)));
    let username = FieldPath::unmarshal("registry_credentials.username").unwrap().unwrap();
    assert!(!username.matches_reset_mask(Some(&mask)));

    let reparsed = Mask::unmarshal(&mask.marshal()).unwrap();
    assert_eq!(reparsed, mask);
}

#[test]
fn test_reset_mask_header() {
    let spec = EndpointSpec {
        image: Some("nginx".to_string()),
        auth_token: Some(Credential::from("hunter2-super-secret-password")),
        ..Default::default()
    };
    let mut headers = Metadata::new();
    headers.add("X-Request-Id", "req-1");
    ensure_reset_mask(&spec, &mut headers);

    let value = headers.get_one(RESET_MASK_HEADER, false).unwrap();
    assert_eq!(value, spec.full_update_reset_mask().marshal());
    assert!(!value.split(',').any(|p| p == "auth_token" || p == "image"));
    assert_eq!(headers.len(), 2);

    // Debug of the endpoint spec never prints the raw token
    assert!(!format!("{:?}", spec).contains("hunter2-super-secret-password"));
}
