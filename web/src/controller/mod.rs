use serde::Serialize;

pub(crate) mod health_check_controller;
pub(crate) mod monzo_controller;
pub(crate) mod oauth_controller;
pub(crate) mod truelayer_controller;

/// `{ "results": [...] }` envelope every list endpoint answers with.
#[derive(Debug, Serialize)]
pub(crate) struct Results<T: Serialize> {
    results: Vec<T>,
}

impl<T: Serialize> Results<T> {
    pub fn new(results: Vec<T>) -> Self {
        Self { results }
    }

    pub fn one(result: T) -> Self {
        Self {
            results: vec![result],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_serialize_results() {
        let serialized = serde_json::to_value(Results::new(vec![1, 2])).unwrap();
        assert_eq!(serialized, json!({"results": [1, 2]}));
    }

    #[tokio::test]
    async fn test_serialize_single_result() {
        let serialized = serde_json::to_string(&Results::one("ok")).unwrap();
        assert_eq!(serialized, json!({"results": ["ok"]}).to_string());
    }
}
