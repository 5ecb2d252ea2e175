//! Unit tests for EIP-2335 keystore validation
//!
//! Tests `Keystore::from_json` to ensure it accepts well-formed documents
//! and reports schema violations naming the offending field.

mod keystore_validation {
    use serde_json::{json, Value};

    use crate::error::Error;
    use crate::keystore::Keystore;

    /// A minimal valid EIP-2335 document.
    fn valid_document() -> Value {
        json!({
            "crypto": {
                "kdf": {
                    "function": "scrypt",
                    "params": {"dklen": 32, "n": 262144, "p": 1, "r": 8, "salt": "d4e5"}
                },
                "checksum": {
                    "function": "sha256",
                    "params": {},
                    "message": "149aafa27b041f3523c53d7acba1905fa6b1c90b9fef137568101f44b531a3cb"
                },
                "cipher": {
                    "function": "aes-128-ctr",
                    "params": {"iv": "264daa3f303d7259501c93d997d84fe6"},
                    "message": "54ecc8863c0550351eee5720f3be6a5d4a016025aa91cd6436cfec938d6a8d30"
                }
            },
            "description": "validator signing key",
            "pubkey": "9612d7a727c9d0a22e185a1c768478dfe919cada9266988cb32359c11f2b7b27f4ae4040902382ae2910c15e2b420d07",
            "path": "m/12381/3600/0/0/0",
            "uuid": "1d85ae20-35c5-4611-98e8-aa14a633906f",
            "version": 4
        })
    }

    fn parse(doc: &Value) -> Result<Keystore, Error> {
        Keystore::from_json(&serde_json::to_vec(doc).unwrap())
    }

    fn schema_error(doc: &Value) -> String {
        match parse(doc).unwrap_err() {
            Error::MalformedKeystore(msg) => msg,
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_document() {
        let keystore = parse(&valid_document()).unwrap();
        assert_eq!(keystore.version, 4);
        assert!(keystore.pubkey.starts_with("9612d7a7"));
    }

    #[test]
    fn validation_is_idempotent() {
        let bytes = serde_json::to_vec(&valid_document()).unwrap();
        let first = Keystore::from_json(&bytes).unwrap();
        let second = Keystore::from_json(&bytes).unwrap();
        assert_eq!(first.uuid, second.uuid);
        assert!(first.validate().is_ok());
        assert!(first.validate().is_ok());
    }

    #[test]
    fn malformed_json_is_a_bad_request() {
        let err = Keystore::from_json(b"{not json").unwrap_err();
        match err {
            Error::BadRequest(msg) => assert!(msg.starts_with("invalid JSON")),
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn missing_path_names_the_field() {
        let mut doc = valid_document();
        doc.as_object_mut().unwrap().remove("path");
        assert_eq!(schema_error(&doc), "missing required field: path");
    }

    #[test]
    fn missing_uuid_names_the_field() {
        let mut doc = valid_document();
        doc.as_object_mut().unwrap().remove("uuid");
        assert_eq!(schema_error(&doc), "missing required field: uuid");
    }

    #[test]
    fn rejects_bad_uuid_shapes() {
        for uuid in [
            "not-a-uuid",
            "1D85AE20-35C5-4611-98E8-AA14A633906F",
            "1d85ae20-35c5-4611-98e8-aa14a633906",
            "1d85ae2035c5461198e8aa14a633906f",
            "1d85ae20-35c5-4611-98e8-aa14a633906f-ff",
        ] {
            let mut doc = valid_document();
            doc["uuid"] = json!(uuid);
            assert_eq!(schema_error(&doc), "invalid uuid format", "uuid {uuid:?}");
        }
    }

    #[test]
    fn rejects_version_below_one() {
        for version in [0, -3] {
            let mut doc = valid_document();
            doc["version"] = json!(version);
            assert_eq!(
                schema_error(&doc),
                "invalid version: must be a number greater than or equal to 1"
            );
        }
    }

    #[test]
    fn crypto_modules_require_function_and_params() {
        let mut doc = valid_document();
        doc["crypto"]["kdf"]["function"] = json!("");
        assert_eq!(
            schema_error(&doc),
            "missing required field: crypto.kdf.function"
        );

        let mut doc = valid_document();
        doc["crypto"]["checksum"]
            .as_object_mut()
            .unwrap()
            .remove("params");
        assert_eq!(
            schema_error(&doc),
            "missing required field: crypto.checksum.params"
        );

        let mut doc = valid_document();
        doc["crypto"]["cipher"]["function"] = json!("");
        assert_eq!(
            schema_error(&doc),
            "missing required field: crypto.cipher.function"
        );
    }

    #[test]
    fn pubkey_and_description_are_optional() {
        let mut doc = valid_document();
        let obj = doc.as_object_mut().unwrap();
        obj.remove("pubkey");
        obj.remove("description");
        let keystore = parse(&doc).unwrap();
        assert!(keystore.pubkey.is_empty());
        assert!(keystore.description.is_empty());
    }
}
