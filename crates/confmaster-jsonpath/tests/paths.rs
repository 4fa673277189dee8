use confmaster_jsonpath::{
    DecodeError, JsonTokenizer, PathDecoder, Token, TokenSource, YamlTokenizer,
};
use pretty_assertions::assert_eq;

fn leaves<S: TokenSource>(source: S) -> Vec<(String, Token)> {
    let mut decoder = PathDecoder::new(source);
    let mut out = Vec::new();
    decoder
        .scan(|path, token| {
            if token.is_scalar() {
                out.push((path.to_string(), token));
            }
            Ok::<_, DecodeError>(())
        })
        .unwrap();
    out
}

#[test]
fn json_and_yaml_report_same_leaf_paths() {
    let json = r#"{"server":{"port":8080,"hosts":["a","b"]},"debug":false}"#;
    let yaml = "server:\n  port: 8080\n  hosts:\n    - a\n    - b\ndebug: false\n";

    let from_json = leaves(JsonTokenizer::new(json.as_bytes()));
    let from_yaml = leaves(YamlTokenizer::new(yaml).unwrap());

    assert_eq!(from_json, from_yaml);
    assert_eq!(
        from_json,
        vec![
            ("server.port".to_string(), Token::Number("8080".into())),
            ("server.hosts[0]".to_string(), Token::String("a".into())),
            ("server.hosts[1]".to_string(), Token::String("b".into())),
            ("debug".to_string(), Token::Bool(false)),
        ]
    );
}

#[test]
fn nested_arrays_of_objects() {
    let yaml = "matrix:\n  - - {x: 1}\n    - {x: 2}\n";
    let result = leaves(YamlTokenizer::new(yaml).unwrap());
    assert_eq!(
        result,
        vec![
            ("matrix[0][0].x".to_string(), Token::Number("1".into())),
            ("matrix[0][1].x".to_string(), Token::Number("2".into())),
        ]
    );
}

#[test]
fn reader_input() {
    let json = br#"{"a":[true,null]}"#;
    let result = leaves(JsonTokenizer::from_reader(&json[..]).unwrap());
    assert_eq!(
        result,
        vec![
            ("a[0]".to_string(), Token::Bool(true)),
            ("a[1]".to_string(), Token::Null),
        ]
    );
}

#[test]
fn syntax_error_surfaces_through_decoder() {
    let mut decoder = PathDecoder::new(JsonTokenizer::new(br#"{"a":[1 2]}"#));
    let err = decoder
        .scan(|_, _| Ok::<_, DecodeError>(()))
        .unwrap_err();
    assert!(matches!(err, DecodeError::Syntax { offset: 8, .. }));
}
