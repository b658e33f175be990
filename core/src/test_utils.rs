pub fn init_log_tests() {
    // set log level via RUST_LOG=debug env var
    let _ = env_logger::builder().is_test(true).try_init();
}

/// An explorer `/boxes/{id}` response. The second token reports a negative decimals count and no
/// name or type; `inclusionHeight` is not a modeled field.
pub const SAMPLE_BOX_JSON: &str = r#"{
    "boxId": "3e762407d99b006d53b6583adcca08ef690b42fb0b2ed7abf63179eb6b9033b2",
    "transactionId": "9148408c04c2e38a6402a7950d6157730fa7d49e9ab3b9cadec481d7769918e9",
    "blockId": "a8ed0a4a5ac3a7d7e6e8f0e54fb0e4d8c0d9b3de0ef2f8f4a8c1e7a0b6a2c3d4",
    "value": 1000000000,
    "index": 0,
    "globalIndex": 9876543,
    "creationHeight": 567000,
    "settlementHeight": 567010,
    "inclusionHeight": 567010,
    "ergoTree": "0008cd0327e65711a59378c59359c3e1d0f7abe906479eccb76094e50fe79d743ccc15e6",
    "ergoTreeConstants": "",
    "address": "9hY16vzHmmfyVBwKeFGHvb2bMFsG94A1u7To1QWtUokACyFVENQ",
    "assets": [
        {
            "tokenId": "03faf2cb329f2e90d6d23b58d91bbb6c046aa143261cc21f52fbe2824bfcbf04",
            "index": 0,
            "amount": 250,
            "name": "SigUSD",
            "decimals": 2,
            "type": "EIP-004"
        },
        {
            "tokenId": "0cd8c9f416e5b1ca9f986a7f10a84191dfb85941619e49e53c0dc30ebf83324b",
            "index": 1,
            "amount": 1,
            "decimals": -1
        }
    ],
    "additionalRegisters": {
        "R4": {
            "serializedValue": "0480897a",
            "sigmaType": "SInt",
            "renderedValue": "1000000"
        }
    },
    "spentTransactionId": null,
    "mainChain": true
}"#;
