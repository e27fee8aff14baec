//! The lookup pipeline: configuration, prefix resolution, fetch, transform,
//! assembly.

use tracing::info;

use crate::assemble::{assemble, KvMap};
use crate::config::{Config, ConfigOverrides, REQUIRED_OPTIONS};
use crate::error::Result;
use crate::executor::{HttpExecutor, ReqwestExecutor};
use crate::facts::{resolve_prefix, FactLookup};
use crate::fetch::fetch;
use crate::transform::Transformer;

/// Run one lookup with an already resolved configuration.
///
/// The instance prefix is resolved before anything touches `executor`, so an
/// unknown fact never produces a request.
pub fn lookup(
    config: &Config,
    facts: &dyn FactLookup,
    executor: &dyn HttpExecutor,
) -> Result<KvMap> {
    let prefix = resolve_prefix(facts, &config.facter_prefix)?;
    let body = fetch(executor, config, &prefix)?;
    let pairs = Transformer::new(config, &prefix).transform(body.as_deref())?;
    let map = assemble(pairs);

    info!(prefix = %prefix, keys = map.len(), "KV lookup complete");
    Ok(map)
}

/// Fetch the KV tree of the node named by the configured fact.
///
/// `overrides` may be empty, in which case every option takes its default.
pub fn consulr_kv(overrides: &ConfigOverrides, facts: &dyn FactLookup) -> Result<KvMap> {
    let config = Config::resolve(overrides, REQUIRED_OPTIONS)?;
    let executor = ReqwestExecutor::new(config.timeout)?;
    lookup(&config, facts, &executor)
}

/// Reduced form: store location only. A 404 from the store is an error.
pub fn consulr_kv_at(uri: &str, nodes_prefix: &str, facts: &dyn FactLookup) -> Result<KvMap> {
    consulr_kv(&ConfigOverrides::positional(uri, nodes_prefix), facts)
}

/// Reduced form naming the fact as well. A 404 from the store is an empty
/// result.
pub fn consulr_kv_at_with_fact(
    uri: &str,
    nodes_prefix: &str,
    facter_prefix: &str,
    facts: &dyn FactLookup,
) -> Result<KvMap> {
    consulr_kv(
        &ConfigOverrides::positional_with_fact(uri, nodes_prefix, facter_prefix),
        facts,
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;

    use super::*;
    use crate::error::{Error, Stage};
    use crate::executor::mock::MockExecutor;
    use crate::facts::StaticFacts;
    use crate::transform::TransformedValue;

    fn host1() -> StaticFacts {
        StaticFacts::new().with_fact("hostname", "host1")
    }

    fn version_listing() -> String {
        json!([{"Key": "nodes/host1/version", "Value": STANDARD.encode("1.2.3")}]).to_string()
    }

    #[test]
    fn value_only_lookup() {
        let executor = MockExecutor::ok(version_listing());
        let map = lookup(&Config::default(), &host1(), &executor).unwrap();

        assert_eq!(
            serde_json::to_value(&map).unwrap(),
            json!({"version": "1.2.3"})
        );
        assert_eq!(
            executor.recorded_requests()[0].url,
            "http://localhost:8500/v1/kv/nodes/host1?recurse"
        );
    }

    #[test]
    fn full_entry_lookup() {
        let config = Config {
            value_only: false,
            ..Config::default()
        };
        let map = lookup(&config, &host1(), &MockExecutor::ok(version_listing())).unwrap();

        assert_eq!(
            serde_json::to_value(&map).unwrap(),
            json!({"version": {"Key": "nodes/host1/version", "Value": "1.2.3"}})
        );
    }

    #[test]
    fn tolerated_404_is_empty() {
        let map = lookup(&Config::default(), &host1(), &MockExecutor::status(404)).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn untolerated_404_is_an_http_error() {
        let config = Config {
            ignore_404: false,
            ..Config::default()
        };
        let err = lookup(&config, &host1(), &MockExecutor::status(404)).unwrap_err();
        assert!(matches!(err, Error::Http { status: 404, .. }));
    }

    #[test]
    fn missing_fact_makes_no_request() {
        let executor = MockExecutor::ok(version_listing());
        let err = lookup(&Config::default(), &StaticFacts::new(), &executor).unwrap_err();

        assert!(matches!(err, Error::PrefixNotFound { .. }));
        assert_eq!(err.stage(), Stage::PrefixResolution);
        assert!(executor.recorded_requests().is_empty());
    }

    #[test]
    fn timeout_returns_no_map() {
        let executor = MockExecutor::timing_out(Duration::from_secs(5));
        let err = lookup(&Config::default(), &host1(), &executor).unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert_eq!(err.stage(), Stage::Transport);
    }

    #[test]
    fn custom_fact_and_nodes_prefix() {
        let config = Config {
            nodes_prefix: "hosts".to_string(),
            facter_prefix: "fqdn".to_string(),
            ..Config::default()
        };
        let facts = StaticFacts::new().with_fact("fqdn", "web.example.com");
        let listing = json!([
            {"Key": "hosts/web.example.com/role", "Value": STANDARD.encode("web")},
            {"Key": "hosts/web.example.com/db/port", "Value": STANDARD.encode("5432")}
        ])
        .to_string();
        let executor = MockExecutor::ok(listing);

        let map = lookup(&config, &facts, &executor).unwrap();
        assert_eq!(map["role"].value(), Some("web"));
        assert_eq!(map["db/port"].value(), Some("5432"));
        assert_eq!(
            executor.recorded_requests()[0].url,
            "http://localhost:8500/v1/kv/hosts/web.example.com?recurse"
        );
    }

    #[test]
    fn lookup_is_repeatable() {
        let executor = MockExecutor::ok(version_listing());
        let first = lookup(&Config::default(), &host1(), &executor).unwrap();
        let second = lookup(&Config::default(), &host1(), &executor).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let listing = json!([
            {"Key": "nodes/host1/version", "Value": STANDARD.encode("1")},
            {"Key": "version", "Value": STANDARD.encode("2")}
        ])
        .to_string();
        let map = lookup(&Config::default(), &host1(), &MockExecutor::ok(listing)).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["version"], TransformedValue::Value(Some("2".to_string())));
    }

    #[test]
    fn binary_value_fails_the_whole_lookup() {
        let listing = json!([
            {"Key": "nodes/host1/version", "Value": STANDARD.encode("1.2.3")},
            {"Key": "nodes/host1/tls/cert", "Value": STANDARD.encode([0x30, 0x82, 0xff])}
        ])
        .to_string();

        let err = lookup(&Config::default(), &host1(), &MockExecutor::ok(listing.clone()))
            .unwrap_err();
        assert!(matches!(err, Error::Decode { ref key, .. } if key == "nodes/host1/tls/cert"));
        assert_eq!(err.stage(), Stage::Transform);

        let raw = Config {
            base64_decode: false,
            ..Config::default()
        };
        let map = lookup(&raw, &host1(), &MockExecutor::ok(listing)).unwrap();
        assert_eq!(
            map["tls/cert"],
            TransformedValue::Value(Some(STANDARD.encode([0x30, 0x82, 0xff])))
        );
    }

    #[test]
    fn missing_required_option_fails_before_lookup() {
        let err = Config::resolve(&ConfigOverrides::new(), &["token"]).unwrap_err();
        assert_eq!(err.stage(), Stage::Configuration);
    }
}
