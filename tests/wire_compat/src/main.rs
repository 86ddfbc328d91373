fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use staticship_protocol::{
        Account, ApiErrorBody, ConfigLimits, Deployment, DeploymentList, Domain, SpaCheckRequest,
        SpaCheckResponse, Token,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Normalizes JSON values so that integer-valued floats compare equal.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => {
                if let Some(f) = n.as_f64() {
                    serde_json::json!(f)
                } else {
                    v.clone()
                }
            }
            serde_json::Value::Object(map) => {
                let normalized: serde_json::Map<String, serde_json::Value> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect();
                serde_json::Value::Object(normalized)
            }
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values. Returns the parsed value for further assertions.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  API:  {fixture}\n  Rust: {reserialized}"
        );
        parsed
    }

    // --- Response bodies ---

    #[test]
    fn fixture_deployment() {
        let d: Deployment = roundtrip_test("deployment.json");
        assert_eq!(d.files, 3);
        assert_eq!(d.labels.as_deref().map(<[String]>::len), Some(2));
    }

    #[test]
    fn fixture_deployment_list_with_sparse_entries() {
        let list: DeploymentList = roundtrip_test("deployment_list.json");
        assert_eq!(list.deployments.len(), 2);
        assert!(list.deployments[0].expires.is_none());
        assert!(list.deployments[0].labels.is_none());
        assert_eq!(list.total, Some(14));
    }

    #[test]
    fn fixture_domain() {
        let domain: Domain = roundtrip_test("domain.json");
        assert_eq!(domain.verified, Some(1718000400));
    }

    #[test]
    fn fixture_token() {
        roundtrip_test::<Token>("token.json");
    }

    #[test]
    fn fixture_account() {
        let account: Account = roundtrip_test("account.json");
        assert!(account.picture.is_none());
    }

    #[test]
    fn fixture_error_body() {
        let body: ApiErrorBody = roundtrip_test("error.json");
        assert_eq!(body.status, 413);
        assert_eq!(body.details.unwrap()["file"], "video.mp4");
    }

    #[test]
    fn fixture_config_limits() {
        let limits: ConfigLimits = roundtrip_test("config.json");
        assert_eq!(limits, ConfigLimits::default());
    }

    // --- SPA detection ---

    #[test]
    fn fixture_spa_check() {
        let req: SpaCheckRequest = roundtrip_test("spa_check_request.json");
        assert_eq!(req.files[0], "index.html");
        let resp: SpaCheckResponse = roundtrip_test("spa_check_response.json");
        assert!(resp.is_spa);
    }

    #[test]
    fn fixtures_parse_as_json() {
        let dir = fixtures_dir();
        for entry in fs::read_dir(&dir).expect("fixtures directory") {
            let path = entry.unwrap().path();
            if path.extension().is_some_and(|e| e == "json") {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                load_fixture(&name);
            }
        }
    }
}
