//! Codec and transport event record tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bytes::Bytes;
use serde_json::json;

use wsplex_core::codec;
use wsplex_core::protocol::event::{Frame, InboundEvent, OutboundEvent};

#[test]
fn codec_roundtrips_canonical_text() {
    // serde_json orders object keys, so canonical inputs are sorted and compact.
    let samples = [
        r#"{"a":[1,2.5,"x"],"b":{"c":null,"d":true}}"#,
        r#"[]"#,
        r#""plain""#,
        r#"-12"#,
        r#"null"#,
    ];
    for s in samples {
        let v = codec::decode(s).unwrap();
        assert_eq!(codec::encode(&v).unwrap(), s);
        assert_eq!(codec::decode(&codec::encode(&v).unwrap()).unwrap(), v);
    }
}

#[test]
fn codec_rejects_malformed_json() {
    let err = codec::decode("{not json").unwrap_err();
    assert_eq!(err.client_code().as_str(), "DECODE_ERROR");
}

#[test]
fn inbound_records_parse() {
    assert_eq!(
        InboundEvent::from_value(json!({ "type": "websocket.connect" })).unwrap(),
        InboundEvent::Connect
    );
    assert_eq!(
        InboundEvent::from_value(json!({ "type": "websocket.receive", "text": "hi" })).unwrap(),
        InboundEvent::Receive(Frame::Text("hi".into()))
    );
    assert_eq!(
        InboundEvent::from_value(json!({ "type": "websocket.receive", "bytes": [1, 2] })).unwrap(),
        InboundEvent::Receive(Frame::Bytes(Bytes::from_static(&[1, 2])))
    );
    assert_eq!(
        InboundEvent::from_value(json!({ "type": "websocket.disconnect", "code": 1001 })).unwrap(),
        InboundEvent::Disconnect { code: 1001 }
    );
}

#[test]
fn receive_needs_exactly_one_section() {
    let both = json!({ "type": "websocket.receive", "text": "a", "bytes": [1] });
    let neither = json!({ "type": "websocket.receive" });
    assert_eq!(InboundEvent::from_value(both).unwrap_err().client_code().as_str(), "PROTOCOL_ERROR");
    assert_eq!(InboundEvent::from_value(neither).unwrap_err().client_code().as_str(), "PROTOCOL_ERROR");
}

#[test]
fn disconnect_requires_code() {
    assert!(InboundEvent::from_value(json!({ "type": "websocket.disconnect" })).is_err());
}

#[test]
fn outbound_close_without_code_is_bare() {
    let bare = OutboundEvent::Close { code: None }.to_value().unwrap();
    assert_eq!(bare, json!({ "type": "websocket.close" }));

    let coded = OutboundEvent::Close { code: Some(4000) }.to_value().unwrap();
    assert_eq!(coded, json!({ "type": "websocket.close", "code": 4000 }));

    let send = OutboundEvent::Send(Frame::Text("x".into())).to_value().unwrap();
    assert_eq!(send, json!({ "type": "websocket.send", "text": "x" }));
}
