use super::*;
use std::collections::HashMap;

#[test]
fn deserialize_many_formats_into_base64url_vec() {
    let json = r#"{
            "array": [101,195,212,161,191,112,75,189,152,52,121,17,62,113,114,164],
            "base64url": "ZcPUob9wS72YNHkRPnFypA",
            "base64url_padded": "ZcPUob9wS72YNHkRPnFypA==",
            "base64": "ZcPUob9wS72YNHkRPnFypA=="
        }"#;

    let deserialized: HashMap<&str, Bytes> =
        serde_json::from_str(json).expect("failed to deserialize");

    assert_eq!(deserialized["array"], deserialized["base64url"]);
    assert_eq!(deserialized["base64url"], deserialized["base64url_padded"]);
    assert_eq!(deserialized["base64url"], deserialized["base64"]);
}

#[test]
fn standard_alphabet_is_accepted() {
    // 0xfb 0xff encodes to "-_8" in base64url and "+/8" in base64
    let url: Bytes = serde_json::from_str(r#""-_8""#).expect("base64url");
    let std: Bytes = serde_json::from_str(r#""+/8=""#).expect("base64");
    assert_eq!(url, std);
    assert_eq!(&*url, &[0xfb, 0xff]);
}

#[test]
fn serializes_as_unpadded_base64url() {
    let bytes = Bytes::from(vec![0xfb, 0xff, 0x00]);
    let json = serde_json::to_string(&bytes).expect("failed to serialize");
    assert_eq!(json, r#""-_8A""#);
}

#[test]
fn deserialization_should_fail() {
    let json = r#"{
            "array": ["ZcPUob9wS72YNHkRPnFypA","ZcPUob9wS72YNHkRPnFypA=="],
        }"#;

    serde_json::from_str::<HashMap<&str, Bytes>>(json)
        .expect_err("did not give an error as expected.");

    serde_json::from_str::<Bytes>(r#""not base64 !""#)
        .expect_err("accepted a string outside both alphabets");
}
