//! Multiplexing envelope vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use serde_json::json;

use wsplex_core::codec;
use wsplex_core::protocol::envelope::Envelope;

use vector_loader::TestVector;

fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

#[test]
fn envelope_vectors() {
    let files = [
        "envelope_ok.json",
        "envelope_null_payload.json",
        "envelope_extra_keys.json",
        "envelope_missing_payload.json",
        "envelope_missing_stream.json",
        "envelope_not_object.json",
        "envelope_stream_not_string.json",
        "envelope_bad_json.json",
    ];

    for f in files {
        let v = load(f);
        let text = v.frame.decode();
        let res = codec::decode(&text).and_then(Envelope::from_value);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.client_code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let env = res.expect("expected ok envelope");
        let ex = v.expect.expect("missing expect block");
        assert_eq!(env.stream, ex["stream"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(env.payload, ex["payload"], "vector={}", v.description);
    }
}

#[test]
fn missing_payload_names_the_problem() {
    let err = Envelope::from_value(json!({ "stream": "a" })).unwrap_err();
    assert!(err.to_string().contains("invalid multiplexed frame received"));
}

#[test]
fn wrap_produces_wire_shape() {
    let env = Envelope::new("a", json!({ "k": 2 }));
    let text = codec::encode(&env.into_value()).unwrap();
    assert_eq!(codec::decode(&text).unwrap(), json!({ "stream": "a", "payload": { "k": 2 } }));
}
