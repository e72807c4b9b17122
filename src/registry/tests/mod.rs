//! Unit tests for the registry module.

mod domain_tests;
mod service_tests;

use serde_json::{json, Value};

/// A complete, schema-valid manifest document used across the test files.
pub(crate) fn sample_manifest_json(name: &str, skill_id: &str) -> Value {
    json!({
        "name": name,
        "description": "Translates text between languages",
        "version": "1.0.0",
        "protocolVersion": "0.3.0",
        "url": "http://localhost:9000/",
        "preferredTransport": "JSONRPC",
        "capabilities": {
            "streaming": true,
            "pushNotifications": false
        },
        "defaultInputModes": ["text/plain"],
        "defaultOutputModes": ["text/plain"],
        "skills": [
            {
                "id": skill_id,
                "name": "Translate",
                "description": "Translate text between language pairs",
                "tags": ["translation", "nlp"]
            }
        ]
    })
}
