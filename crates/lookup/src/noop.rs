//! No-op lookup — used when the web lookup is disabled.

use async_trait::async_trait;
use banter_core::error::LookupError;
use banter_core::lookup::Lookup;

pub struct NoopLookup;

#[async_trait]
impl Lookup for NoopLookup {
    fn name(&self) -> &str {
        "noop"
    }

    async fn lookup(&self, _query: &str) -> std::result::Result<String, LookupError> {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_empty() {
        let lookup = NoopLookup;
        assert_eq!(lookup.lookup("anything").await.unwrap(), "");
    }
}
