//! # consulr
//!
//! Fetch a node's configuration from a Consul KV tree as a flat mapping.
//!
//! Keys for a node live under `<nodes_prefix>/<instance>/`, where the
//! instance segment is the value of a fact such as `hostname`. A lookup
//! issues one recursive GET for that subtree, decodes the base64 values,
//! strips the `<nodes_prefix>/<instance>/` prefix from every key and returns
//! the result as a map.
//!
//! ```ignore
//! use consulr::{consulr_kv, ConfigOverrides, StaticFacts};
//!
//! let facts = StaticFacts::new().with_fact("hostname", "web01");
//! let overrides = ConfigOverrides::new().with_uri("http://consul:8500");
//!
//! // nodes/web01/version = "1.2.3"  =>  {"version": "1.2.3"}
//! let map = consulr_kv(&overrides, &facts)?;
//! ```
//!
//! ## Options
//!
//! | option          | default                  |
//! |-----------------|--------------------------|
//! | `uri`           | `http://localhost:8500`  |
//! | `nodes_prefix`  | `nodes`                  |
//! | `facter_prefix` | `hostname`               |
//! | `value_only`    | `true`                   |
//! | `base64_decode` | `true`                   |
//! | `ignore_404`    | `true`                   |
//! | `token`         | none                     |
//! | `timeout`       | 5 seconds (`0`: none)    |
//! | `strict_json`   | `false`                  |
//!
//! Values are returned as text. With `base64_decode` on, a value whose
//! decoded bytes are not UTF-8 (a DER certificate, say) fails the whole
//! lookup with [`Error::Decode`]; store binary values with
//! `base64_decode: false` to get the base64 text back instead.

pub mod assemble;
pub mod config;
pub mod error;
pub mod executor;
pub mod facts;
pub mod fetch;
pub mod lookup;
pub mod transform;
pub mod types;

pub use assemble::KvMap;
pub use config::{Config, ConfigOverrides, REQUIRED_OPTIONS};
pub use error::{Error, Result, Stage};
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use facts::{ChainedFacts, EnvFacts, FactLookup, StaticFacts};
pub use lookup::{consulr_kv, consulr_kv_at, consulr_kv_at_with_fact, lookup};
pub use transform::{KvEntry, TransformedValue};
pub use types::{HttpRequest, HttpResponse};
